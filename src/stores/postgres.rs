//! PostgreSQL implementation of [`LedgerStore`].
//!
//! # Atomicity Guarantees
//!
//! Linking an item, approving and rejecting a transaction each run inside one
//! database transaction. Every other operation is a single statement.

use async_trait::async_trait;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::linked_account::{LinkedAccount, ReconcileState};
use crate::models::transaction::{LedgerTransaction, NewTransaction};
use crate::stores::LedgerStore;

#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: DbPool,
}

impl PgLedgerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;

        Ok(())
    }

    async fn linked_account(&self) -> Result<Option<LinkedAccount>, AppError> {
        let account = sqlx::query_as::<_, LinkedAccount>(
            "SELECT * FROM linked_accounts ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// # Process
    ///
    /// 1. Lock the table so two concurrent exchanges cannot both insert
    /// 2. Update the first row if there is one, otherwise insert
    /// 3. Commit
    async fn save_item_link(
        &self,
        access_token: &str,
        item_id: &str,
    ) -> Result<LinkedAccount, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("LOCK TABLE linked_accounts IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let existing: Option<i32> =
            sqlx::query_scalar("SELECT id FROM linked_accounts ORDER BY id LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;

        let account = match existing {
            Some(id) => {
                sqlx::query_as::<_, LinkedAccount>(
                    r#"
                    UPDATE linked_accounts
                    SET access_token = $1,
                        item_id = $2
                    WHERE id = $3
                    RETURNING *
                    "#,
                )
                .bind(access_token)
                .bind(item_id)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, LinkedAccount>(
                    r#"
                    INSERT INTO linked_accounts (access_token, item_id)
                    VALUES ($1, $2)
                    RETURNING *
                    "#,
                )
                .bind(access_token)
                .bind(item_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;

        Ok(account)
    }

    async fn save_cursor(&self, account_id: i32, cursor: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE linked_accounts SET cursor = $1 WHERE id = $2")
            .bind(cursor)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn save_reconcile_state(
        &self,
        account_id: i32,
        state: &ReconcileState,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE linked_accounts
            SET needs_reconcile = $1,
                currently_reconciling = $2,
                current_tx = $3,
                current_month = $4
            WHERE id = $5
            "#,
        )
        .bind(state.needs_reconcile)
        .bind(state.currently_reconciling)
        .bind(&state.current_tx)
        .bind(state.current_month)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_needs_reconcile(&self, account_id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE linked_accounts SET needs_reconcile = TRUE WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn add_pending(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Option<LedgerTransaction>, AppError> {
        // Skips ids already pending (ON CONFLICT) or already approved or rejected (NOT EXISTS)
        let inserted = sqlx::query_as::<_, LedgerTransaction>(
            r#"
            INSERT INTO pending_transactions (
                source_transaction_id,
                name,
                amount_cents,
                category,
                category_id,
                date
            )
            SELECT $1::text, $2::varchar, $3::bigint, $4::varchar, $5::integer, $6::timestamptz
            WHERE $1::text IS NULL
               OR (
                   NOT EXISTS (
                       SELECT 1 FROM approved_transactions WHERE source_transaction_id = $1::text
                   )
                   AND NOT EXISTS (
                       SELECT 1 FROM rejected_transactions WHERE source_transaction_id = $1::text
                   )
               )
            ON CONFLICT (source_transaction_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&transaction.source_transaction_id)
        .bind(&transaction.name)
        .bind(transaction.amount_cents)
        .bind(&transaction.category)
        .bind(transaction.category_id)
        .bind(transaction.date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn remove_pending_by_source_id(
        &self,
        source_transaction_id: &str,
    ) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM pending_transactions WHERE source_transaction_id = $1")
                .bind(source_transaction_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn pending_transactions(&self) -> Result<Vec<LedgerTransaction>, AppError> {
        let transactions = sqlx::query_as::<_, LedgerTransaction>(
            "SELECT * FROM pending_transactions ORDER BY date, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn approved_transactions(&self) -> Result<Vec<LedgerTransaction>, AppError> {
        let transactions = sqlx::query_as::<_, LedgerTransaction>(
            "SELECT * FROM approved_transactions ORDER BY date, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn pending_transaction(&self, id: i64) -> Result<Option<LedgerTransaction>, AppError> {
        let transaction = sqlx::query_as::<_, LedgerTransaction>(
            "SELECT * FROM pending_transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn approve(&self, id: i64) -> Result<LedgerTransaction, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(pending) = sqlx::query_as::<_, LedgerTransaction>(
            "DELETE FROM pending_transactions WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            tx.rollback().await?;
            return Err(AppError::TransactionNotFound);
        };

        let approved = sqlx::query_as::<_, LedgerTransaction>(
            r#"
            INSERT INTO approved_transactions (
                source_transaction_id,
                name,
                amount_cents,
                category,
                category_id,
                date
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&pending.source_transaction_id)
        .bind(&pending.name)
        .bind(pending.amount_cents)
        .bind(&pending.category)
        .bind(pending.category_id)
        .bind(pending.date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(approved)
    }

    async fn reject(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(source_id) = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM pending_transactions WHERE id = $1 RETURNING source_transaction_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            tx.rollback().await?;
            return Err(AppError::TransactionNotFound);
        };

        if let Some(source_id) = source_id {
            sqlx::query(
                r#"
                INSERT INTO rejected_transactions (source_transaction_id)
                VALUES ($1)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(source_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}
