// Back-office endpoints, mounted under /api/admin/transactions behind AdminAuth
//
// Endpoints:
// - POST /approve-offline   - Approve a pending offline payment
// - PUT  /approve-offline   - Reject a pending offline payment
// - GET  /{id}              - Transaction with installments
// - POST /{id}/delivery     - Record that tickets were handed over

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};
use crate::middleware::AdminPrincipal;
use crate::modules::transactions::models::{TicketTransaction, TransactionDetails};
use crate::modules::transactions::services::TransactionService;

/// Body of approve / reject calls
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub transaction_id: Option<String>,
    pub admin_notes: Option<String>,
}

impl ReviewRequest {
    fn transaction_id(&self) -> Result<&str> {
        self.transaction_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::validation("transactionId is required"))
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub message: &'static str,
    pub transaction: TransactionDetails,
}

#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub success: bool,
    pub transaction: TicketTransaction,
}

/// POST /approve-offline
pub async fn approve_offline(
    principal: AdminPrincipal,
    service: web::Data<TransactionService>,
    request: web::Json<ReviewRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let transaction_id = request.transaction_id()?.to_string();

    let transaction = service
        .approve_offline(&transaction_id, principal.actor()?, request.admin_notes)
        .await?;

    Ok(HttpResponse::Ok().json(ReviewResponse {
        success: true,
        message: "Transaction approved",
        transaction,
    }))
}

/// PUT /approve-offline
pub async fn reject_offline(
    principal: AdminPrincipal,
    service: web::Data<TransactionService>,
    request: web::Json<ReviewRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let transaction_id = request.transaction_id()?.to_string();

    let transaction = service
        .reject_offline(&transaction_id, principal.actor()?, request.admin_notes)
        .await?;

    Ok(HttpResponse::Ok().json(ReviewResponse {
        success: true,
        message: "Transaction rejected",
        transaction,
    }))
}

/// GET /{id}
pub async fn get_transaction(
    service: web::Data<TransactionService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let details = service.get_transaction(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(details))
}

/// POST /{id}/delivery
pub async fn record_delivery(
    principal: AdminPrincipal,
    service: web::Data<TransactionService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let transaction = service
        .record_ticket_delivery(&path.into_inner(), principal.actor()?)
        .await?;

    Ok(HttpResponse::Ok().json(DeliveryResponse {
        success: true,
        transaction,
    }))
}

/// Register admin routes relative to the enclosing scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/approve-offline")
            .route(web::post().to(approve_offline))
            .route(web::put().to(reject_offline)),
    )
    .route("/{id}", web::get().to(get_transaction))
    .route("/{id}/delivery", web::post().to(record_delivery));
}
