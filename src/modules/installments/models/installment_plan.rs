use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::AppError;

/// Down payment plus monthly schedule computed from a ticket total.
///
/// Never persisted on its own: installment-type transactions store the
/// `installments` as `PaymentInstallment` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPlan {
    pub total_amount: Decimal,
    /// Upfront payment, `0 <= reservation < total`
    pub reservation_amount: Decimal,
    /// `total_amount - reservation_amount`
    pub remaining_amount: Decimal,
    /// Display estimate, not the exact per-installment amount
    pub monthly_amount: Decimal,
    pub installments: Vec<PlannedInstallment>,
}

/// One entry of a computed schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedInstallment {
    /// Sequential number, starting at 1
    pub installment_number: i32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

impl InstallmentPlan {
    /// Sum of all scheduled amounts
    pub fn scheduled_total(&self) -> Decimal {
        self.installments.iter().map(|i| i.amount).sum()
    }
}

/// Reasons a plan cannot be computed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Total amount must be greater than zero")]
    InvalidTotalAmount,

    #[error("Reservation amount cannot be negative")]
    InvalidReservationAmount,

    #[error("Reservation amount must be less than the total amount")]
    ReservationExceedsTotal,

    #[error("Installments count must be at least 1")]
    InvalidInstallmentsCount,

    #[error("Amounts must have at most {0} decimal places")]
    InvalidAmountScale(u32),

    #[error("Installments count must be at most {0}")]
    TooManyInstallments(i32),

    #[error("Due date for installment {0} is out of range")]
    DueDateOutOfRange(i32),
}

impl PlanError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::InvalidTotalAmount => "invalid_total_amount",
            PlanError::InvalidReservationAmount => "invalid_reservation_amount",
            PlanError::ReservationExceedsTotal => "reservation_exceeds_total",
            PlanError::InvalidInstallmentsCount => "invalid_installments_count",
            PlanError::InvalidAmountScale(_) => "invalid_amount_scale",
            PlanError::TooManyInstallments(_) => "too_many_installments",
            PlanError::DueDateOutOfRange(_) => "due_date_out_of_range",
        }
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        AppError::validation(err.to_string())
    }
}
