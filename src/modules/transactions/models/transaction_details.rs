use serde::Serialize;

use crate::modules::installments::PaymentInstallment;
use crate::modules::transactions::models::TicketTransaction;

/// A transaction together with its installment rows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub transaction: TicketTransaction,
    /// Ordered by installment number; empty for full payments
    pub installments: Vec<PaymentInstallment>,
}

/// Result of a committed transition
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub transaction: TicketTransaction,
    /// Installment #1 when it was settled in the same write
    pub settled_installment: Option<PaymentInstallment>,
}
