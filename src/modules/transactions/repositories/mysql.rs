use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{MySql, MySqlPool, Transaction};
use std::future::Future;
use std::str::FromStr;
use tracing::{debug, warn};

use super::transaction_repository::{concurrent_modification, TransactionRepository};
use crate::core::{AppError, Currency, Result};
use crate::modules::installments::{InstallmentStatus, PaymentInstallment};
use crate::modules::transactions::models::{
    PaymentStatus, PaymentType, TicketDeliveryMode, TicketDeliveryStatus, TicketItem,
    TicketTransaction, Transition, TransitionOutcome,
};

/// Attempts for a unit of work that lost a deadlock or serialization race
const MAX_ATTEMPTS: u32 = 3;

/// SQLSTATE reported by MySQL for deadlocks and serialization failures
const SERIALIZATION_FAILURE: &str = "40001";

const TRANSACTION_COLUMNS: &str = r#"
    id, event_id, buyer_email, ticket_items, total_amount, currency,
    payment_status, payment_type, admin_notes, reviewed_by, reviewed_at,
    gateway, gateway_reference, ticket_delivery_mode, ticket_delivery_status,
    version, created_at, updated_at
"#;

const INSTALLMENT_COLUMNS: &str = r#"
    id, transaction_id, installment_number, amount, status, due_date,
    admin_approved, approved_by, approved_at, paid_at, created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct TicketTransactionRow {
    id: String,
    event_id: String,
    buyer_email: String,
    ticket_items: Json<Vec<TicketItem>>,
    total_amount: Decimal,
    currency: String,
    payment_status: String,
    payment_type: String,
    admin_notes: Option<String>,
    reviewed_by: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    gateway: Option<String>,
    gateway_reference: Option<String>,
    ticket_delivery_mode: String,
    ticket_delivery_status: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn corrupt_column(err: String) -> AppError {
    AppError::internal(format!("Corrupt stored value: {}", err))
}

impl TryFrom<TicketTransactionRow> for TicketTransaction {
    type Error = AppError;

    fn try_from(row: TicketTransactionRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            event_id: row.event_id,
            buyer_email: row.buyer_email,
            ticket_items: row.ticket_items.0,
            total_amount: row.total_amount,
            currency: Currency::from_str(&row.currency).map_err(corrupt_column)?,
            payment_status: PaymentStatus::from_str(&row.payment_status)
                .map_err(corrupt_column)?,
            payment_type: PaymentType::from_str(&row.payment_type).map_err(corrupt_column)?,
            admin_notes: row.admin_notes,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            gateway: row.gateway,
            gateway_reference: row.gateway_reference,
            ticket_delivery_mode: TicketDeliveryMode::from_str(&row.ticket_delivery_mode)
                .map_err(corrupt_column)?,
            ticket_delivery_status: TicketDeliveryStatus::from_str(&row.ticket_delivery_status)
                .map_err(corrupt_column)?,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentInstallmentRow {
    id: String,
    transaction_id: String,
    installment_number: i32,
    amount: Decimal,
    status: String,
    due_date: NaiveDate,
    admin_approved: bool,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentInstallmentRow> for PaymentInstallment {
    type Error = AppError;

    fn try_from(row: PaymentInstallmentRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            transaction_id: row.transaction_id,
            installment_number: row.installment_number,
            amount: row.amount,
            status: InstallmentStatus::try_from(row.status).map_err(corrupt_column)?,
            due_date: row.due_date,
            admin_approved: row.admin_approved,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn is_serialization_failure(err: &AppError) -> bool {
    match err {
        AppError::Database(sqlx::Error::Database(db_err)) => {
            db_err.code().as_deref() == Some(SERIALIZATION_FAILURE)
        }
        _ => false,
    }
}

/// MySQL-backed transaction store
pub struct MySqlTransactionRepository {
    pool: MySqlPool,
}

impl MySqlTransactionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Run a unit of work, retrying it when MySQL aborts it with 40001
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_fn().await {
                Err(err) if attempt < MAX_ATTEMPTS && is_serialization_failure(&err) => {
                    warn!(operation, attempt, error = %err, "Retrying after serialization failure");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn fetch_transaction(
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<Option<TicketTransaction>> {
        let query = format!(
            "SELECT {} FROM ticket_transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        );
        sqlx::query_as::<_, TicketTransactionRow>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .map(TicketTransaction::try_from)
            .transpose()
    }

    /// Distinguish a missing row from a lost race after a zero-row update
    async fn stale_write_error(tx: &mut Transaction<'_, MySql>, id: &str) -> Result<AppError> {
        let exists: Option<(String,)> =
            sqlx::query_as("SELECT id FROM ticket_transactions WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;

        Ok(match exists {
            Some(_) => concurrent_modification(id),
            None => AppError::not_found(format!("Transaction '{}' not found", id)),
        })
    }

    async fn try_commit_transition(&self, transition: &Transition) -> Result<TransitionOutcome> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE ticket_transactions
            SET payment_status = ?,
                reviewed_by = ?,
                reviewed_at = ?,
                admin_notes = COALESCE(?, admin_notes),
                gateway = COALESCE(?, gateway),
                gateway_reference = COALESCE(?, gateway_reference),
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND payment_status = 'pending' AND version = ?
            "#,
        )
        .bind(transition.target.as_str())
        .bind(transition.actor.identity())
        .bind(transition.at)
        .bind(&transition.admin_notes)
        .bind(&transition.gateway)
        .bind(&transition.gateway_reference)
        .bind(transition.at)
        .bind(&transition.transaction_id)
        .bind(transition.expected_version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let err = Self::stale_write_error(&mut tx, &transition.transaction_id).await?;
            tx.rollback().await?;
            return Err(err);
        }

        let mut settled_installment = None;
        if let Some(settlement) = &transition.settle_first_installment {
            let query = format!(
                "SELECT {} FROM payment_installments \
                 WHERE transaction_id = ? AND installment_number = 1 FOR UPDATE",
                INSTALLMENT_COLUMNS
            );
            let first = sqlx::query_as::<_, PaymentInstallmentRow>(&query)
                .bind(&transition.transaction_id)
                .fetch_optional(&mut *tx)
                .await?
                .map(PaymentInstallment::try_from)
                .transpose()?;

            match first {
                Some(mut row) if !row.is_paid() => {
                    row.mark_as_paid(settlement)?;

                    sqlx::query(
                        r#"
                        UPDATE payment_installments
                        SET status = ?, admin_approved = ?, approved_by = ?,
                            approved_at = ?, paid_at = ?, updated_at = ?
                        WHERE id = ? AND status = 'pending'
                        "#,
                    )
                    .bind(row.status.as_str())
                    .bind(row.admin_approved)
                    .bind(&row.approved_by)
                    .bind(row.approved_at)
                    .bind(row.paid_at)
                    .bind(row.updated_at)
                    .bind(&row.id)
                    .execute(&mut *tx)
                    .await?;

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

        let transaction = Self::fetch_transaction(&mut tx, &transition.transaction_id)
            .await?
            .ok_or_else(|| AppError::internal("Transaction vanished during transition"))?;

        tx.commit().await?;

        debug!(
            transaction_id = %transaction.id,
            status = %transaction.payment_status,
            version = transaction.version,
            "Committed transaction transition"
        );

        Ok(TransitionOutcome {
            transaction,
            settled_installment,
        })
    }

    async fn try_mark_delivered(
        &self,
        transaction_id: &str,
        expected_version: i64,
        at: DateTime<Utc>,
    ) -> Result<TicketTransaction> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE ticket_transactions
            SET ticket_delivery_status = 'delivered', version = version + 1, updated_at = ?
            WHERE id = ? AND version = ?
              AND payment_status = 'approved' AND ticket_delivery_status = 'pending'
            "#,
        )
        .bind(at)
        .bind(transaction_id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let err = Self::stale_write_error(&mut tx, transaction_id).await?;
            tx.rollback().await?;
            return Err(err);
        }

        let transaction = Self::fetch_transaction(&mut tx, transaction_id)
            .await?
            .ok_or_else(|| AppError::internal("Transaction vanished during delivery"))?;

        tx.commit().await?;
        Ok(transaction)
    }
}

#[async_trait]
impl TransactionRepository for MySqlTransactionRepository {
    async fn create(
        &self,
        transaction: &TicketTransaction,
        installments: &[PaymentInstallment],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO ticket_transactions (
                id, event_id, buyer_email, ticket_items, total_amount, currency,
                payment_status, payment_type, admin_notes, reviewed_by, reviewed_at,
                gateway, gateway_reference, ticket_delivery_mode, ticket_delivery_status,
                version, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.event_id)
        .bind(&transaction.buyer_email)
        .bind(Json(&transaction.ticket_items))
        .bind(transaction.total_amount)
        .bind(transaction.currency.as_str())
        .bind(transaction.payment_status.as_str())
        .bind(transaction.payment_type.as_str())
        .bind(&transaction.admin_notes)
        .bind(&transaction.reviewed_by)
        .bind(transaction.reviewed_at)
        .bind(&transaction.gateway)
        .bind(&transaction.gateway_reference)
        .bind(transaction.ticket_delivery_mode.as_str())
        .bind(transaction.ticket_delivery_status.as_str())
        .bind(transaction.version)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&mut *tx)
        .await?;

        for installment in installments {
            sqlx::query(
                r#"
                INSERT INTO payment_installments (
                    id, transaction_id, installment_number, amount, status, due_date,
                    admin_approved, approved_by, approved_at, paid_at, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&installment.id)
            .bind(&installment.transaction_id)
            .bind(installment.installment_number)
            .bind(installment.amount)
            .bind(installment.status.as_str())
            .bind(installment.due_date)
            .bind(installment.admin_approved)
            .bind(&installment.approved_by)
            .bind(installment.approved_at)
            .bind(installment.paid_at)
            .bind(installment.created_at)
            .bind(installment.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TicketTransaction>> {
        let query = format!(
            "SELECT {} FROM ticket_transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        );
        sqlx::query_as::<_, TicketTransactionRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(TicketTransaction::try_from)
            .transpose()
    }

    async fn find_installments(&self, transaction_id: &str) -> Result<Vec<PaymentInstallment>> {
        let query = format!(
            "SELECT {} FROM payment_installments WHERE transaction_id = ? \
             ORDER BY installment_number ASC",
            INSTALLMENT_COLUMNS
        );
        sqlx::query_as::<_, PaymentInstallmentRow>(&query)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(PaymentInstallment::try_from)
            .collect()
    }

    async fn commit_transition(&self, transition: &Transition) -> Result<TransitionOutcome> {
        self.with_retry("commit_transition", || {
            self.try_commit_transition(transition)
        })
        .await
    }

    async fn mark_delivered(
        &self,
        transaction_id: &str,
        expected_version: i64,
        at: DateTime<Utc>,
    ) -> Result<TicketTransaction> {
        self.with_retry("mark_delivered", || {
            self.try_mark_delivered(transaction_id, expected_version, at)
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
