use rust_decimal::Decimal;
use serde::Deserialize;

use super::gateway_trait::{
    GatewayKind, GatewayNotification, PaymentGateway, PaymentVerdict, WebhookHeaders,
};
use super::signature::verify_hmac_sha256;
use crate::core::{AppError, Result};

pub const SIGNATURE_HEADER: &str = "x-webpay-signature";
const SIGNATURE_PREFIX: &str = "sha256=";

/// Transaction result as posted by Webpay
#[allow(dead_code)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebpayResult {
    buy_order: Option<String>,
    session_id: Option<String>,
    amount: Option<Decimal>,
    status: Option<String>,
    card_number: Option<String>,
    authorization_code: Option<String>,
    payment_type: Option<String>,
    installments: Option<i32>,
    transaction_date: Option<String>,
    vci: Option<String>,
}

/// Webpay webhook verification and parsing.
///
/// Signature header: `x-webpay-signature: sha256=<hex>` over the raw body.
pub struct WebpayGateway {
    webhook_secret: String,
}

impl WebpayGateway {
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    fn verdict(status: &str) -> PaymentVerdict {
        match status {
            "AUTHORIZED" => PaymentVerdict::Approved,
            "FAILED" | "REVERSED" => PaymentVerdict::Rejected,
            _ => PaymentVerdict::Pending,
        }
    }
}

impl PaymentGateway for WebpayGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Webpay
    }

    fn verify_webhook(&self, headers: &WebhookHeaders, body: &[u8]) -> Result<()> {
        let header = headers.require(SIGNATURE_HEADER)?;
        let signature = header.strip_prefix(SIGNATURE_PREFIX).ok_or_else(|| {
            AppError::invalid_signature("x-webpay-signature must start with sha256=")
        })?;

        verify_hmac_sha256(self.webhook_secret.as_bytes(), body, signature)
    }

    fn parse_notification(&self, body: &[u8]) -> Result<GatewayNotification> {
        let result: WebpayResult = serde_json::from_slice(body)
            .map_err(|e| AppError::malformed(format!("Invalid Webpay payload: {}", e)))?;

        let transaction_id = result
            .buy_order
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| AppError::not_found("Webpay result has no buyOrder"))?
            .to_string();

        let raw_status = result.status.unwrap_or_default();

        Ok(GatewayNotification {
            gateway: GatewayKind::Webpay,
            transaction_id,
            verdict: Self::verdict(&raw_status),
            raw_status,
            gateway_reference: result.authorization_code,
            // Webpay sends no approval time; the receiving side stamps it
            paid_at: None,
            installments: result.installments,
            status_detail: result.vci,
            amount: result.amount,
        })
    }
}
