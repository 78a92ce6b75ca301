use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::Result;
use crate::modules::installments::PaymentInstallment;
use crate::modules::transactions::models::{TicketTransaction, Transition, TransitionOutcome};

/// Persistence for ticket transactions and their installment rows.
///
/// Writes that change state are conditional: implementations must apply them
/// only while the stored `version` equals the expected one, and report
/// `AppError::Conflict` otherwise.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Insert a transaction and its installments as one unit
    async fn create(
        &self,
        transaction: &TicketTransaction,
        installments: &[PaymentInstallment],
    ) -> Result<()>;

    /// Find transaction by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<TicketTransaction>>;

    /// All installments of a transaction, ordered by number
    async fn find_installments(&self, transaction_id: &str) -> Result<Vec<PaymentInstallment>>;

    /// Apply a status transition and its installment side effect atomically
    async fn commit_transition(&self, transition: &Transition) -> Result<TransitionOutcome>;

    /// Flip ticket delivery to delivered, conditional on `expected_version`
    async fn mark_delivered(
        &self,
        transaction_id: &str,
        expected_version: i64,
        at: DateTime<Utc>,
    ) -> Result<TicketTransaction>;

    /// Connectivity probe for readiness checks
    async fn ping(&self) -> Result<()>;
}

pub(crate) fn concurrent_modification(transaction_id: &str) -> crate::core::AppError {
    crate::core::AppError::conflict(format!(
        "Transaction '{}' was modified by another request",
        transaction_id
    ))
}
