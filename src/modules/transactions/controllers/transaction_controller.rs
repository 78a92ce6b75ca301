// Checkout endpoint
//
// Endpoints:
// - POST /api/transactions - Create a pending ticket transaction (and its installments)

use actix_web::{web, HttpResponse};

use crate::core::Result;
use crate::modules::transactions::models::CreateTransactionRequest;
use crate::modules::transactions::services::TransactionService;

/// POST /api/transactions
///
/// # Returns
/// - 201: the transaction with its installment rows
/// - 400: item, currency or plan validation failed
pub async fn create_transaction(
    service: web::Data<TransactionService>,
    request: web::Json<CreateTransactionRequest>,
) -> Result<HttpResponse> {
    let details = service.create_transaction(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(details))
}

/// Configure checkout routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/transactions").route("", web::post().to(create_transaction)));
}
