use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::installments::models::InstallmentPlan;

/// Persisted installment row, child of a ticket transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstallment {
    pub id: String,
    pub transaction_id: String,
    /// Sequential number (1, 2, 3...)
    pub installment_number: i32,
    pub amount: Decimal,
    pub status: InstallmentStatus,
    pub due_date: NaiveDate,
    pub admin_approved: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// Not yet paid
    Pending,
    /// Payment received
    Paid,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl std::fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for InstallmentStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            _ => Err(format!("Invalid installment status: {}", value)),
        }
    }
}

/// Who settled an installment and when the money arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallmentSettlement {
    pub approved_by: String,
    pub approved_at: DateTime<Utc>,
    pub paid_at: DateTime<Utc>,
}

impl PaymentInstallment {
    /// Create a pending installment row
    pub fn new(
        transaction_id: String,
        installment_number: i32,
        amount: Decimal,
        due_date: NaiveDate,
    ) -> Result<Self> {
        if installment_number < 1 {
            return Err(AppError::validation(format!(
                "Installment number must be at least 1, got {}",
                installment_number
            )));
        }

        if amount < Decimal::ZERO {
            return Err(AppError::validation("Installment amount cannot be negative"));
        }

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            transaction_id,
            installment_number,
            amount,
            status: InstallmentStatus::Pending,
            due_date,
            admin_approved: false,
            approved_by: None,
            approved_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Materialize every scheduled entry of a plan as a pending row
    pub fn from_plan(transaction_id: &str, plan: &InstallmentPlan) -> Result<Vec<Self>> {
        plan.installments
            .iter()
            .map(|planned| {
                Self::new(
                    transaction_id.to_string(),
                    planned.installment_number,
                    planned.amount,
                    planned.due_date,
                )
            })
            .collect()
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    /// Mark installment as paid and approved
    pub fn mark_as_paid(&mut self, settlement: &InstallmentSettlement) -> Result<()> {
        if self.is_paid() {
            return Err(AppError::invalid_transition(format!(
                "Installment {} is already paid",
                self.installment_number
            )));
        }

        self.status = InstallmentStatus::Paid;
        self.admin_approved = true;
        self.approved_by = Some(settlement.approved_by.clone());
        self.approved_at = Some(settlement.approved_at);
        self.paid_at = Some(settlement.paid_at);
        self.updated_at = settlement.approved_at;

        Ok(())
    }
}
