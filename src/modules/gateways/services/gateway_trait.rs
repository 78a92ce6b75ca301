use actix_web::http::header::HeaderMap;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::core::{AppError, Result};
use crate::modules::transactions::models::PaymentStatus;

/// Payment gateway webhook contract: authenticate, then interpret
pub trait PaymentGateway: Send + Sync {
    /// Which gateway this is
    fn kind(&self) -> GatewayKind;

    /// Verify the webhook signature against the raw request body.
    ///
    /// Must run before `parse_notification` results are acted on.
    fn verify_webhook(&self, headers: &WebhookHeaders, body: &[u8]) -> Result<()>;

    /// Extract the payment outcome from a verified body
    fn parse_notification(&self, body: &[u8]) -> Result<GatewayNotification>;
}

/// Supported gateways
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayKind {
    MercadoPago,
    Webpay,
}

impl GatewayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::MercadoPago => "mercadopago",
            GatewayKind::Webpay => "webpay",
        }
    }
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mercadopago" => Ok(GatewayKind::MercadoPago),
            "webpay" => Ok(GatewayKind::Webpay),
            _ => Err(AppError::not_found(format!(
                "Unknown payment gateway '{}'",
                s
            ))),
        }
    }
}

/// Gateway outcome reduced to what the state machine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentVerdict {
    Approved,
    Rejected,
    /// In process, authorized-pending, unknown: leave the transaction alone
    Pending,
}

impl PaymentVerdict {
    pub fn target_status(&self) -> PaymentStatus {
        match self {
            PaymentVerdict::Approved => PaymentStatus::Approved,
            PaymentVerdict::Rejected => PaymentStatus::Rejected,
            PaymentVerdict::Pending => PaymentStatus::Pending,
        }
    }
}

/// Normalized webhook content
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayNotification {
    pub gateway: GatewayKind,
    /// Our transaction id, echoed as external reference / buy order
    pub transaction_id: String,
    pub verdict: PaymentVerdict,
    /// Status string exactly as the gateway sent it
    pub raw_status: String,
    /// Payment id (MercadoPago) or authorization code (Webpay)
    pub gateway_reference: Option<String>,
    /// Gateway-reported approval time, when it sends one
    pub paid_at: Option<DateTime<Utc>>,
    pub installments: Option<i32>,
    pub status_detail: Option<String>,
    pub amount: Option<Decimal>,
}

impl GatewayNotification {
    /// Whether an approval for an installment purchase also pays installment #1
    pub fn settles_first_installment(&self) -> bool {
        if self.verdict != PaymentVerdict::Approved {
            return false;
        }
        match self.gateway {
            // Card split into several gateway installments
            GatewayKind::MercadoPago => self.installments.unwrap_or(1) > 1,
            GatewayKind::Webpay => true,
        }
    }
}

/// Lower-cased snapshot of the request headers a gateway may sign with
#[derive(Debug, Clone, Default)]
pub struct WebhookHeaders {
    values: HashMap<String, String>,
}

impl WebhookHeaders {
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let values = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.trim().to_string()))
            })
            .collect();
        Self { values }
    }

    /// Add a header; names are case-insensitive
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Header value or `InvalidSignature` naming the missing header
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| AppError::invalid_signature(format!("Missing {} header", name)))
    }
}
