use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::warn;

use super::transaction_repository::{concurrent_modification, TransactionRepository};
use crate::core::{AppError, Result};
use crate::modules::installments::PaymentInstallment;
use crate::modules::transactions::models::{TicketTransaction, Transition, TransitionOutcome};

#[derive(Default)]
struct MemoryState {
    transactions: HashMap<String, TicketTransaction>,
    /// Keyed by transaction id, kept sorted by installment number
    installments: HashMap<String, Vec<PaymentInstallment>>,
}

/// Process-local store used for `STORE_BACKEND=memory` and tests.
///
/// Every commit runs under one write lock, which gives the same
/// all-or-nothing visibility as the MySQL transaction.
#[derive(Default)]
pub struct InMemoryTransactionRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn create(
        &self,
        transaction: &TicketTransaction,
        installments: &[PaymentInstallment],
    ) -> Result<()> {
        let mut state = self.state.write().await;

        if state.transactions.contains_key(&transaction.id) {
            return Err(AppError::conflict(format!(
                "Transaction '{}' already exists",
                transaction.id
            )));
        }

        let mut rows = installments.to_vec();
        rows.sort_by_key(|i| i.installment_number);

        state
            .transactions
            .insert(transaction.id.clone(), transaction.clone());
        state.installments.insert(transaction.id.clone(), rows);

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TicketTransaction>> {
        Ok(self.state.read().await.transactions.get(id).cloned())
    }

    async fn find_installments(&self, transaction_id: &str) -> Result<Vec<PaymentInstallment>> {
        Ok(self
            .state
            .read()
            .await
            .installments
            .get(transaction_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn commit_transition(&self, transition: &Transition) -> Result<TransitionOutcome> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let stored = state
            .transactions
            .get(&transition.transaction_id)
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Transaction '{}' not found",
                    transition.transaction_id
                ))
            })?;

        if stored.version != transition.expected_version || !stored.is_pending() {
            return Err(concurrent_modification(&transition.transaction_id));
        }

        // Work on copies so a failure leaves the store untouched
        let mut transaction = stored.clone();
        transaction.apply_transition(transition)?;

        let mut settled_installment = None;
        if let Some(settlement) = &transition.settle_first_installment {
            let first = state
                .installments
                .get(&transition.transaction_id)
                .and_then(|rows| rows.iter().find(|i| i.installment_number == 1));

            match first {
                Some(row) if !row.is_paid() => {
                    let mut row = row.clone();
                    row.mark_as_paid(settlement)?;
                    settled_installment = Some(row);
                }
                Some(_) => warn!(
                    transaction_id = %transition.transaction_id,
                    "Installment 1 already paid, leaving it unchanged"
                ),
                None => warn!(
                    transaction_id = %transition.transaction_id,
                    "Installment transaction has no installment 1 row"
                ),
            }
        }

        if let Some(row) = &settled_installment {
            if let Some(rows) = state.installments.get_mut(&transition.transaction_id) {
                if let Some(slot) = rows.iter_mut().find(|i| i.id == row.id) {
                    *slot = row.clone();
                }
            }
        }
        state
            .transactions
            .insert(transaction.id.clone(), transaction.clone());

        Ok(TransitionOutcome {
            transaction,
            settled_installment,
        })
    }

    async fn mark_delivered(
        &self,
        transaction_id: &str,
        expected_version: i64,
        at: DateTime<Utc>,
    ) -> Result<TicketTransaction> {
        let mut state = self.state.write().await;

        let stored = state.transactions.get_mut(transaction_id).ok_or_else(|| {
            AppError::not_found(format!("Transaction '{}' not found", transaction_id))
        })?;

        if stored.version != expected_version {
            return Err(concurrent_modification(transaction_id));
        }

        let mut updated = stored.clone();
        updated.mark_delivered(at)?;
        *stored = updated.clone();

        Ok(updated)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
