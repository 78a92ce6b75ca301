use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::gateway_trait::{
    GatewayKind, GatewayNotification, PaymentGateway, PaymentVerdict, WebhookHeaders,
};
use super::signature::verify_hmac_sha256;
use crate::core::{AppError, Result};

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Timestamps above this are treated as milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Payment notification body as posted by MercadoPago
#[derive(Debug, Deserialize)]
struct MercadoPagoPayment {
    /// Numeric or string depending on API version
    id: Option<Value>,
    status: Option<String>,
    status_detail: Option<String>,
    #[allow(dead_code)]
    payment_method_id: Option<String>,
    transaction_amount: Option<Decimal>,
    installments: Option<i32>,
    external_reference: Option<String>,
    #[allow(dead_code)]
    date_created: Option<String>,
    date_approved: Option<String>,
}

/// Only `id` is needed to rebuild the signed manifest
#[derive(Debug, Deserialize)]
struct PaymentId {
    id: Option<Value>,
}

fn id_string(id: Option<&Value>) -> Option<String> {
    match id {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// MercadoPago webhook verification and parsing.
///
/// Signature header: `x-signature: ts=<unix>,v1=<hex>`. The signed manifest is
/// `id:<payment id>;request-id:<x-request-id>;ts:<ts>;`.
pub struct MercadoPagoGateway {
    webhook_secret: String,
    tolerance_secs: u64,
}

impl MercadoPagoGateway {
    pub fn new(webhook_secret: impl Into<String>, tolerance_secs: u64) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            tolerance_secs,
        }
    }

    /// Split `ts=...,v1=...` into (ts, v1)
    fn parse_signature_header(header: &str) -> Result<(&str, &str)> {
        let mut ts = None;
        let mut v1 = None;

        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("ts", value)) => ts = Some(value.trim()),
                Some(("v1", value)) => v1 = Some(value.trim()),
                _ => {}
            }
        }

        match (ts, v1) {
            (Some(ts), Some(v1)) if !ts.is_empty() && !v1.is_empty() => Ok((ts, v1)),
            _ => Err(AppError::invalid_signature(
                "x-signature header must carry ts and v1",
            )),
        }
    }

    fn check_freshness(&self, ts: &str, now: DateTime<Utc>) -> Result<()> {
        let raw: i64 = ts
            .parse()
            .map_err(|_| AppError::invalid_signature("Signature timestamp is not numeric"))?;
        let seconds = if raw > MILLIS_THRESHOLD { raw / 1000 } else { raw };

        let skew = now
            .timestamp()
            .checked_sub(seconds)
            .map(i64::unsigned_abs)
            .ok_or_else(|| AppError::invalid_signature("Signature timestamp out of range"))?;

        if skew > self.tolerance_secs {
            return Err(AppError::invalid_signature(
                "Signature timestamp outside tolerance",
            ));
        }
        Ok(())
    }

    /// Verify against an explicit clock
    pub fn verify_at(
        &self,
        headers: &WebhookHeaders,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let (ts, v1) = Self::parse_signature_header(headers.require(SIGNATURE_HEADER)?)?;
        let request_id = headers.require(REQUEST_ID_HEADER)?;

        self.check_freshness(ts, now)?;

        let payment: PaymentId = serde_json::from_slice(body)
            .map_err(|e| AppError::malformed(format!("MercadoPago body is not JSON: {}", e)))?;
        let id = id_string(payment.id.as_ref())
            .ok_or_else(|| AppError::invalid_signature("Payment id missing from signed body"))?;

        let manifest = format!("id:{};request-id:{};ts:{};", id, request_id, ts);
        verify_hmac_sha256(self.webhook_secret.as_bytes(), manifest.as_bytes(), v1)
    }

    fn verdict(status: &str) -> PaymentVerdict {
        match status {
            "approved" => PaymentVerdict::Approved,
            "rejected" | "cancelled" => PaymentVerdict::Rejected,
            _ => PaymentVerdict::Pending,
        }
    }
}

impl PaymentGateway for MercadoPagoGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::MercadoPago
    }

    fn verify_webhook(&self, headers: &WebhookHeaders, body: &[u8]) -> Result<()> {
        self.verify_at(headers, body, Utc::now())
    }

    fn parse_notification(&self, body: &[u8]) -> Result<GatewayNotification> {
        let payment: MercadoPagoPayment = serde_json::from_slice(body)
            .map_err(|e| AppError::malformed(format!("Invalid MercadoPago payload: {}", e)))?;

        let transaction_id = payment
            .external_reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::not_found("MercadoPago payment has no external_reference"))?
            .to_string();

        let raw_status = payment.status.unwrap_or_default();

        let paid_at = payment.date_approved.as_deref().and_then(|raw| {
            match DateTime::parse_from_rfc3339(raw) {
                Ok(at) => Some(at.with_timezone(&Utc)),
                Err(e) => {
                    warn!(date_approved = raw, error = %e, "Ignoring unparseable date_approved");
                    None
                }
            }
        });

        Ok(GatewayNotification {
            gateway: GatewayKind::MercadoPago,
            transaction_id,
            verdict: Self::verdict(&raw_status),
            raw_status,
            gateway_reference: id_string(payment.id.as_ref()),
            paid_at,
            installments: payment.installments,
            status_detail: payment.status_detail,
            amount: payment.transaction_amount,
        })
    }
}
