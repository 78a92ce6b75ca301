// Plan preview endpoint
//
// Endpoints:
// - POST /api/installments/plan - Compute a reservation + monthly schedule without persisting it

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::modules::installments::{
    models::{InstallmentPlan, PlanError},
    services::InstallmentCalculator,
};

/// Request for POST /api/installments/plan
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub total_amount: Decimal,
    #[serde(default)]
    pub reservation_amount: Decimal,
    pub installments_count: i32,
    pub start_date: NaiveDate,
}

/// Successful plan response
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub success: bool,
    #[serde(flatten)]
    pub plan: InstallmentPlan,
}

/// Failed plan response; calculator failures are reported, not raised
#[derive(Debug, Serialize)]
pub struct PlanFailure {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

impl From<PlanError> for PlanFailure {
    fn from(err: PlanError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            code: err.code(),
        }
    }
}

/// POST /api/installments/plan
///
/// # Returns
/// - 200: `{ success: true, totalAmount, reservationAmount, remainingAmount, monthlyAmount, installments }`
/// - 400: `{ success: false, error, code }`
pub async fn preview_plan(request: web::Json<PlanRequest>) -> Result<HttpResponse> {
    let request = request.into_inner();

    let response = match InstallmentCalculator::calculate_plan(
        request.total_amount,
        request.reservation_amount,
        request.installments_count,
        request.start_date,
    ) {
        Ok(plan) => HttpResponse::Ok().json(PlanResponse {
            success: true,
            plan,
        }),
        Err(err) => {
            tracing::debug!(code = err.code(), "Rejected installment plan request");
            HttpResponse::BadRequest().json(PlanFailure::from(err))
        }
    };

    Ok(response)
}

/// Configure installment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/installments").route("/plan", web::post().to(preview_plan)));
}
