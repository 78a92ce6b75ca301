use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::{info, warn};

use crate::core::Result;
use crate::modules::gateways::{GatewayRegistry, WebhookHeaders};
use crate::modules::transactions::services::TransactionService;

/// Acknowledgement returned to the gateway
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
    pub message: &'static str,
}

/// Receive a payment gateway webhook
///
/// POST /api/webhooks/{gateway}
///
/// The raw body is kept as bytes: signatures are computed over it (Webpay)
/// or over ids taken from it (MercadoPago), so it is verified before any
/// field is trusted.
///
/// # Returns
/// * `200 OK` - Processed, left pending, or already processed
/// * `401 Unauthorized` - Missing or invalid signature
/// * `404 Not Found` - Unknown gateway or transaction
/// * `409 Conflict` - Outcome contradicts an already settled transaction
/// * `500 Internal Server Error` - Unreadable body; gateways redeliver
pub async fn receive_webhook(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
    gateways: web::Data<GatewayRegistry>,
    service: web::Data<TransactionService>,
) -> Result<HttpResponse> {
    let gateway_name = path.into_inner();
    let gateway = gateways.get(&gateway_name)?;

    let headers = WebhookHeaders::from_header_map(req.headers());
    if let Err(e) = gateway.verify_webhook(&headers, &body) {
        warn!(gateway = %gateway.kind(), error = %e, "Rejected webhook signature");
        return Err(e);
    }

    let notification = gateway.parse_notification(&body)?;
    info!(
        gateway = %notification.gateway,
        transaction_id = %notification.transaction_id,
        status = %notification.raw_status,
        "Received verified webhook"
    );

    let disposition = service.apply_gateway_notification(&notification).await?;

    Ok(HttpResponse::Ok().json(WebhookAck {
        success: true,
        message: disposition.message(),
    }))
}

/// Register webhook routes relative to the enclosing scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/{gateway}", web::post().to(receive_webhook));
}
