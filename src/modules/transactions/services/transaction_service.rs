use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::capacity_revalidator::CapacityRevalidator;
use crate::core::{Actor, AppError, Result};
use crate::modules::gateways::GatewayNotification;
use crate::modules::installments::{
    InstallmentCalculator, InstallmentSettlement, PaymentInstallment,
};
use crate::modules::transactions::models::{
    CreateTransactionRequest, PaymentStatus, PaymentType, TicketTransaction, TransactionDetails,
    Transition,
};
use crate::modules::transactions::repositories::TransactionRepository;

/// What a gateway notification did to its transaction
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayDisposition {
    /// Pending transaction moved to approved or rejected
    Transitioned(TicketTransaction),
    /// Gateway reported a non-final status; nothing written
    Unchanged,
    /// Redelivery of an outcome that is already recorded
    AlreadyApplied,
}

impl GatewayDisposition {
    pub fn message(&self) -> &'static str {
        match self {
            GatewayDisposition::Transitioned(_) => "Webhook processed",
            GatewayDisposition::Unchanged => "Webhook received, transaction left pending",
            GatewayDisposition::AlreadyApplied => "Webhook already processed",
        }
    }
}

/// Transaction lifecycle: creation, admin review, gateway results, delivery
///
/// Every status change goes through `TransactionRepository::commit_transition`,
/// which only writes while the row is still pending at the version read here.
pub struct TransactionService {
    repository: Arc<dyn TransactionRepository>,
    capacity: Arc<dyn CapacityRevalidator>,
}

impl TransactionService {
    pub fn new(
        repository: Arc<dyn TransactionRepository>,
        capacity: Arc<dyn CapacityRevalidator>,
    ) -> Self {
        Self {
            repository,
            capacity,
        }
    }

    /// Create a pending transaction, with its installment rows for installment purchases
    pub async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<TransactionDetails> {
        let transaction = TicketTransaction::new(&request)?;

        let installments = match (request.payment_type, &request.installment_plan) {
            (PaymentType::Installment, Some(plan)) => {
                request
                    .currency
                    .validate_amount(plan.reservation_amount)
                    .map_err(AppError::validation)?;

                let schedule = InstallmentCalculator::calculate_plan(
                    transaction.total_amount,
                    plan.reservation_amount,
                    plan.installments_count,
                    plan.start_date,
                )?;
                PaymentInstallment::from_plan(&transaction.id, &schedule)?
            }
            (PaymentType::Installment, None) => {
                return Err(AppError::validation(
                    "installmentPlan is required for installment purchases",
                ));
            }
            (PaymentType::Full, Some(_)) => {
                return Err(AppError::validation(
                    "installmentPlan is only accepted for installment purchases",
                ));
            }
            (PaymentType::Full, None) => Vec::new(),
        };

        self.repository.create(&transaction, &installments).await?;

        info!(
            transaction_id = %transaction.id,
            event_id = %transaction.event_id,
            total = %transaction.total_amount,
            currency = %transaction.currency,
            installments = installments.len(),
            "Created ticket transaction"
        );

        Ok(TransactionDetails {
            transaction,
            installments,
        })
    }

    /// Transaction with its installments
    pub async fn get_transaction(&self, id: &str) -> Result<TransactionDetails> {
        let transaction = self.load(id).await?;
        let installments = self.repository.find_installments(id).await?;

        Ok(TransactionDetails {
            transaction,
            installments,
        })
    }

    /// Manual approval of an offline payment.
    ///
    /// For installment purchases installment #1 is marked paid in the same write.
    pub async fn approve_offline(
        &self,
        transaction_id: &str,
        actor: Actor,
        admin_notes: Option<String>,
    ) -> Result<TransactionDetails> {
        Self::require_admin(&actor)?;
        let transaction = self.load(transaction_id).await?;
        transaction.ensure_pending()?;

        let mut transition = Transition::new(&transaction, PaymentStatus::Approved, actor);
        transition.admin_notes = normalize_notes(admin_notes);
        if transaction.is_installment() {
            transition.settle_first_installment = Some(InstallmentSettlement {
                approved_by: transition.actor.identity().to_string(),
                approved_at: transition.at,
                paid_at: transition.at,
            });
        }

        let outcome = self.repository.commit_transition(&transition).await?;

        info!(
            transaction_id,
            reviewer = %transition.actor,
            installment_settled = outcome.settled_installment.is_some(),
            "Offline payment approved"
        );

        self.revalidate_capacity(&outcome.transaction);
        self.get_transaction(transaction_id).await
    }

    /// Manual rejection; installments are left as they are
    pub async fn reject_offline(
        &self,
        transaction_id: &str,
        actor: Actor,
        admin_notes: Option<String>,
    ) -> Result<TransactionDetails> {
        Self::require_admin(&actor)?;
        let transaction = self.load(transaction_id).await?;
        transaction.ensure_pending()?;

        let mut transition = Transition::new(&transaction, PaymentStatus::Rejected, actor);
        transition.admin_notes = normalize_notes(admin_notes);

        self.repository.commit_transition(&transition).await?;

        info!(transaction_id, reviewer = %transition.actor, "Offline payment rejected");

        self.get_transaction(transaction_id).await
    }

    /// Apply a verified gateway notification
    pub async fn apply_gateway_notification(
        &self,
        notification: &GatewayNotification,
    ) -> Result<GatewayDisposition> {
        let actor = Actor::gateway(notification.gateway.as_str())?;
        let transaction = self.load(&notification.transaction_id).await?;
        let target = notification.verdict.target_status();

        if !transaction.is_pending() {
            return Self::settled_disposition(&transaction, target, notification);
        }

        if target == PaymentStatus::Pending {
            info!(
                transaction_id = %transaction.id,
                gateway = %notification.gateway,
                status = %notification.raw_status,
                "Gateway reported a non-final status"
            );
            return Ok(GatewayDisposition::Unchanged);
        }

        let mut transition = Transition::new(&transaction, target, actor);
        transition.gateway = Some(notification.gateway.as_str().to_string());
        transition.gateway_reference = notification.gateway_reference.clone();
        if transaction.is_installment() && notification.settles_first_installment() {
            transition.settle_first_installment = Some(InstallmentSettlement {
                approved_by: transition.actor.identity().to_string(),
                approved_at: transition.at,
                paid_at: notification.paid_at.unwrap_or(transition.at),
            });
        }

        let outcome = match self.repository.commit_transition(&transition).await {
            Ok(outcome) => outcome,
            Err(AppError::Conflict(msg)) => {
                // A concurrent delivery of the same result counts as success
                let current = self.load(&notification.transaction_id).await?;
                if current.payment_status == target {
                    return Ok(GatewayDisposition::AlreadyApplied);
                }
                return Err(AppError::Conflict(msg));
            }
            Err(e) => return Err(e),
        };

        info!(
            transaction_id = %outcome.transaction.id,
            gateway = %notification.gateway,
            status = %outcome.transaction.payment_status,
            installment_settled = outcome.settled_installment.is_some(),
            "Applied gateway notification"
        );

        if outcome.transaction.payment_status == PaymentStatus::Approved {
            self.revalidate_capacity(&outcome.transaction);
        }

        Ok(GatewayDisposition::Transitioned(outcome.transaction))
    }

    /// Mark tickets as handed over; only approved, undelivered transactions qualify
    pub async fn record_ticket_delivery(
        &self,
        transaction_id: &str,
        actor: Actor,
    ) -> Result<TicketTransaction> {
        let transaction = self.load(transaction_id).await?;
        transaction.ensure_deliverable()?;

        let delivered = self
            .repository
            .mark_delivered(transaction_id, transaction.version, Utc::now())
            .await?;

        info!(
            transaction_id,
            actor = %actor,
            mode = delivered.ticket_delivery_mode.as_str(),
            "Ticket delivery recorded"
        );
        Ok(delivered)
    }

    /// Storage readiness
    pub async fn ping(&self) -> Result<()> {
        self.repository.ping().await
    }

    async fn load(&self, id: &str) -> Result<TicketTransaction> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Transaction '{}' not found", id)))
    }

    fn require_admin(actor: &Actor) -> Result<()> {
        if !actor.is_admin() {
            return Err(AppError::unauthorized(
                "Manual review requires an admin principal",
            ));
        }
        Ok(())
    }

    fn settled_disposition(
        transaction: &TicketTransaction,
        target: PaymentStatus,
        notification: &GatewayNotification,
    ) -> Result<GatewayDisposition> {
        if target == transaction.payment_status || target == PaymentStatus::Pending {
            info!(
                transaction_id = %transaction.id,
                gateway = %notification.gateway,
                status = %transaction.payment_status,
                "Ignoring notification for settled transaction"
            );
            return Ok(GatewayDisposition::AlreadyApplied);
        }

        warn!(
            transaction_id = %transaction.id,
            gateway = %notification.gateway,
            current = %transaction.payment_status,
            reported = %target,
            "Gateway outcome contradicts settled transaction"
        );
        Err(AppError::conflict(format!(
            "Transaction '{}' is already {}",
            transaction.id, transaction.payment_status
        )))
    }

    /// Best-effort refresh of the event's availability, run after the reply path
    fn revalidate_capacity(&self, transaction: &TicketTransaction) {
        let capacity = Arc::clone(&self.capacity);
        let transaction_id = transaction.id.clone();
        let event_id = transaction.event_id.clone();

        tokio::spawn(async move {
            if let Err(e) = capacity.revalidate(&event_id).await {
                warn!(
                    transaction_id = %transaction_id,
                    event_id = %event_id,
                    error = %e,
                    "Capacity revalidation failed"
                );
            }
        });
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}
