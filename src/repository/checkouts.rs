//! Checkout ledger repository
//!
//! The ledger is append-only: records are inserted at checkout time and
//! closed (returned_at set) at return time, never mutated otherwise and
//! never deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookSummary,
        checkout::{CheckoutDetails, CheckoutRecord, HistoryFilter},
        profile::ProfileSummary,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutRepository: Send + Sync {
    /// Append an open record for a fresh checkout.
    async fn open(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<CheckoutRecord>;
    /// Close the most recent open record for `(book_id, user_id)`.
    /// `NotFound` when no open record matches: the ledger and the catalog
    /// have drifted apart and the caller must surface that.
    async fn close(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<CheckoutRecord>;
    async fn history(&self, filter: &HistoryFilter) -> AppResult<Vec<CheckoutDetails>>;
    async fn find_open_by_book(&self, book_id: Uuid) -> AppResult<Option<CheckoutRecord>>;
}

#[derive(Clone)]
pub struct PgCheckoutRepository {
    pool: Pool<Postgres>,
}

impl PgCheckoutRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckoutRepository for PgCheckoutRepository {
    async fn open(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<CheckoutRecord> {
        let record = sqlx::query_as::<_, CheckoutRecord>(
            r#"
            INSERT INTO checkout_history (book_id, user_id, checked_out_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn close(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<CheckoutRecord> {
        sqlx::query_as::<_, CheckoutRecord>(
            r#"
            UPDATE checkout_history
            SET returned_at = $3
            WHERE id = (
                SELECT id FROM checkout_history
                WHERE book_id = $1 AND user_id = $2 AND returned_at IS NULL
                ORDER BY checked_out_at DESC
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No open checkout record for book {} and user {}",
                book_id, user_id
            ))
        })
    }

    async fn history(&self, filter: &HistoryFilter) -> AppResult<Vec<CheckoutDetails>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Uuid> = Vec::new();

        if let Some(book_id) = filter.book_id {
            params.push(book_id);
            conditions.push(format!("h.book_id = ${}", params.len()));
        }
        if let Some(user_id) = filter.user_id {
            params.push(user_id);
            conditions.push(format!("h.user_id = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };

        // Books may be deleted after the fact; the ledger survives, so both
        // joins stay LEFT.
        let query = format!(
            r#"
            SELECT h.id, h.book_id, h.user_id, h.checked_out_at, h.returned_at,
                   b.id AS joined_book_id, b.title, b.author, b.is_checked_out, b.genre,
                   p.id AS profile_id, p.full_name, p.email
            FROM checkout_history h
            LEFT JOIN books b ON b.id = h.book_id
            LEFT JOIN profiles p ON p.id = h.user_id
            WHERE {}
            ORDER BY h.checked_out_at DESC
            "#,
            where_clause
        );

        let mut q = sqlx::query(&query);
        for param in &params {
            q = q.bind(param);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let book = row
                .get::<Option<Uuid>, _>("joined_book_id")
                .map(|id| BookSummary {
                    id,
                    title: row.get("title"),
                    author: row.get("author"),
                    is_checked_out: row.get("is_checked_out"),
                    genre: row.get("genre"),
                });
            let borrower = row
                .get::<Option<Uuid>, _>("profile_id")
                .map(|id| ProfileSummary {
                    id,
                    full_name: row.get("full_name"),
                    email: row.get("email"),
                });

            result.push(CheckoutDetails {
                id: row.get("id"),
                book_id: row.get("book_id"),
                user_id: row.get("user_id"),
                checked_out_at: row.get("checked_out_at"),
                returned_at: row.get("returned_at"),
                book,
                borrower,
            });
        }

        Ok(result)
    }

    async fn find_open_by_book(&self, book_id: Uuid) -> AppResult<Option<CheckoutRecord>> {
        let record = sqlx::query_as::<_, CheckoutRecord>(
            r#"
            SELECT * FROM checkout_history
            WHERE book_id = $1 AND returned_at IS NULL
            ORDER BY checked_out_at DESC
            LIMIT 1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
