use crate::core::{Actor, AppError, Currency, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest amount a DECIMAL(14, 2) column holds
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Payment status of a ticket transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Waiting for a gateway result or a manual review
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "approved" => Ok(PaymentStatus::Approved),
            "rejected" => Ok(PaymentStatus::Rejected),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// Whether the buyer pays at once or through an installment plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Full,
    Installment,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Full => "full",
            PaymentType::Installment => "installment",
        }
    }
}

impl FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "full" => Ok(PaymentType::Full),
            "installment" => Ok(PaymentType::Installment),
            _ => Err(format!("Invalid payment type: {}", s)),
        }
    }
}

/// How tickets reach the buyer once the payment is approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TicketDeliveryMode {
    /// Generated PDF sent by the delivery process
    #[default]
    Automatic,
    /// Tickets uploaded by hand in the back office
    ManualUpload,
}

impl TicketDeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketDeliveryMode::Automatic => "automatic",
            TicketDeliveryMode::ManualUpload => "manualUpload",
        }
    }
}

impl FromStr for TicketDeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(TicketDeliveryMode::Automatic),
            "manualUpload" => Ok(TicketDeliveryMode::ManualUpload),
            _ => Err(format!("Invalid ticket delivery mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketDeliveryStatus {
    #[default]
    Pending,
    Delivered,
}

impl TicketDeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketDeliveryStatus::Pending => "pending",
            TicketDeliveryStatus::Delivered => "delivered",
        }
    }
}

impl FromStr for TicketDeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TicketDeliveryStatus::Pending),
            "delivered" => Ok(TicketDeliveryStatus::Delivered),
            _ => Err(format!("Invalid ticket delivery status: {}", s)),
        }
    }
}

/// One line of a ticket order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketItem {
    /// Venue zone (e.g. "general", "vip")
    pub zone: String,
    pub quantity: i32,
    /// Unit price
    pub price: Decimal,
}

impl TicketItem {
    /// Price times quantity, `None` on overflow
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Ticket purchase tracked through pending → approved | rejected.
///
/// `id` is also sent to the gateways as external reference / buy order, so
/// webhook calls resolve back to this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTransaction {
    pub id: String,
    pub event_id: String,
    pub buyer_email: String,
    pub ticket_items: Vec<TicketItem>,
    pub total_amount: Decimal,
    pub currency: Currency,
    pub payment_status: PaymentStatus,
    pub payment_type: PaymentType,
    pub admin_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Gateway that settled the payment, if any
    pub gateway: Option<String>,
    /// Gateway payment id or authorization code
    pub gateway_reference: Option<String>,
    pub ticket_delivery_mode: TicketDeliveryMode,
    pub ticket_delivery_status: TicketDeliveryStatus,
    /// Bumped on every write; conditional updates compare against it
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for POST /api/transactions
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub event_id: String,
    pub buyer_email: String,
    pub currency: Currency,
    pub ticket_items: Vec<TicketItem>,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub ticket_delivery_mode: TicketDeliveryMode,
    /// Required when `payment_type` is installment
    pub installment_plan: Option<InstallmentPlanRequest>,
}

/// Plan parameters supplied at checkout; the total comes from the items
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPlanRequest {
    #[serde(default)]
    pub reservation_amount: Decimal,
    pub installments_count: i32,
    pub start_date: NaiveDate,
}

impl TicketTransaction {
    /// Create a pending transaction from a checkout request
    pub fn new(request: &CreateTransactionRequest) -> Result<Self> {
        if request.event_id.trim().is_empty() {
            return Err(AppError::validation("Event ID cannot be empty"));
        }

        if !request.buyer_email.contains('@') {
            return Err(AppError::validation("Buyer email is invalid"));
        }

        if request.ticket_items.is_empty() {
            return Err(AppError::validation("At least one ticket item is required"));
        }

        for item in &request.ticket_items {
            if item.zone.trim().is_empty() {
                return Err(AppError::validation("Ticket zone cannot be empty"));
            }
            if item.quantity < 1 {
                return Err(AppError::validation(format!(
                    "Quantity for zone '{}' must be at least 1",
                    item.zone
                )));
            }
            if item.price <= Decimal::ZERO {
                return Err(AppError::validation(format!(
                    "Price for zone '{}' must be positive",
                    item.zone
                )));
            }
            if item.price > MAX_AMOUNT {
                return Err(AppError::validation(format!(
                    "Price for zone '{}' exceeds {}",
                    item.zone, MAX_AMOUNT
                )));
            }
            request
                .currency
                .validate_amount(item.price)
                .map_err(AppError::validation)?;
        }

        let total_amount = request
            .ticket_items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| {
                item.line_total().and_then(|line| sum.checked_add(line))
            })
            .filter(|total| *total <= MAX_AMOUNT)
            .ok_or_else(|| {
                AppError::validation(format!("Order total exceeds {}", MAX_AMOUNT))
            })?;
        let now = Utc::now();

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_id: request.event_id.clone(),
            buyer_email: request.buyer_email.clone(),
            ticket_items: request.ticket_items.clone(),
            total_amount,
            currency: request.currency,
            payment_status: PaymentStatus::Pending,
            payment_type: request.payment_type,
            admin_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            gateway: None,
            gateway_reference: None,
            ticket_delivery_mode: request.ticket_delivery_mode,
            ticket_delivery_status: TicketDeliveryStatus::Pending,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.payment_status == PaymentStatus::Pending
    }

    pub fn is_installment(&self) -> bool {
        self.payment_type == PaymentType::Installment
    }

    /// Precondition of every admin review
    pub fn ensure_pending(&self) -> Result<()> {
        if !self.is_pending() {
            return Err(AppError::invalid_transition(
                "Transaction is not pending approval",
            ));
        }
        Ok(())
    }

    /// Gate checked before tickets are handed over
    pub fn ensure_deliverable(&self) -> Result<()> {
        if self.payment_status != PaymentStatus::Approved {
            return Err(AppError::invalid_transition(format!(
                "Tickets cannot be delivered while payment is {}",
                self.payment_status
            )));
        }
        if self.ticket_delivery_status == TicketDeliveryStatus::Delivered {
            return Err(AppError::invalid_transition(
                "Tickets were already delivered",
            ));
        }
        Ok(())
    }

    /// Apply a status transition in memory, bumping the version
    pub fn apply_transition(&mut self, transition: &Transition) -> Result<()> {
        self.ensure_pending()?;

        if transition.target == PaymentStatus::Pending {
            return Err(AppError::invalid_transition(
                "Transactions can only move to approved or rejected",
            ));
        }

        self.payment_status = transition.target;
        self.reviewed_by = Some(transition.actor.identity().to_string());
        self.reviewed_at = Some(transition.at);
        if let Some(notes) = &transition.admin_notes {
            self.admin_notes = Some(notes.clone());
        }
        if let Some(gateway) = &transition.gateway {
            self.gateway = Some(gateway.clone());
        }
        if let Some(reference) = &transition.gateway_reference {
            self.gateway_reference = Some(reference.clone());
        }
        self.version += 1;
        self.updated_at = transition.at;

        Ok(())
    }

    /// Record that tickets were handed over, bumping the version
    pub fn mark_delivered(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.ensure_deliverable()?;
        self.ticket_delivery_status = TicketDeliveryStatus::Delivered;
        self.version += 1;
        self.updated_at = at;
        Ok(())
    }
}

/// A single approve/reject write, applied atomically by the repository.
///
/// The transaction row is only updated while it is still pending at
/// `expected_version`; the optional installment settlement lands in the
/// same unit of work.
#[derive(Debug, Clone)]
pub struct Transition {
    pub transaction_id: String,
    pub expected_version: i64,
    pub target: PaymentStatus,
    pub actor: Actor,
    pub at: DateTime<Utc>,
    pub admin_notes: Option<String>,
    pub gateway: Option<String>,
    pub gateway_reference: Option<String>,
    pub settle_first_installment: Option<crate::modules::installments::InstallmentSettlement>,
}

impl Transition {
    pub fn new(transaction: &TicketTransaction, target: PaymentStatus, actor: Actor) -> Self {
        Self {
            transaction_id: transaction.id.clone(),
            expected_version: transaction.version,
            target,
            actor,
            at: Utc::now(),
            admin_notes: None,
            gateway: None,
            gateway_reference: None,
            settle_first_installment: None,
        }
    }
}
