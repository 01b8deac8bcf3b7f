//! Books repository for catalog reads and conditional mutation

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookFields, BookQuery, BookSummary, LendingExpectation, LendingState},
};

/// Outcome of a compare-and-swap style lending write.
#[derive(Debug, Clone)]
pub enum ConditionalUpdate {
    /// The precondition held and the row was updated.
    Applied(Book),
    /// The row no longer matched the expected state; nothing was written.
    Conflict,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Book>;
    async fn create(&self, fields: &BookFields, created_by: Uuid) -> AppResult<Book>;
    async fn update(&self, id: Uuid, fields: &BookFields) -> AppResult<Book>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    /// Write `target` to the lending columns only while the row still
    /// matches `expected`. This is the sole synchronization primitive the
    /// circulation core relies on.
    async fn update_lending(
        &self,
        id: Uuid,
        expected: LendingExpectation,
        target: LendingState,
    ) -> AppResult<ConditionalUpdate>;
    /// Unconditionally reset the lending columns (the return path).
    async fn clear_lending(&self, id: Uuid) -> AppResult<Book>;
    async fn genres(&self) -> AppResult<Vec<String>>;
    async fn summaries(&self) -> AppResult<Vec<BookSummary>>;
}

#[derive(Clone)]
pub struct PgBookRepository {
    pool: Pool<Postgres>,
}

impl PgBookRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref search) = query.search {
            params.push(format!("%{}%", search));
            let n = params.len();
            conditions.push(format!(
                "(title ILIKE ${n} OR author ILIKE ${n} OR isbn ILIKE ${n} OR genre ILIKE ${n})"
            ));
        }

        if let Some(ref genre) = query.genre {
            params.push(genre.clone());
            conditions.push(format!("genre = ${}", params.len()));
        }

        if let Some(available) = query.available {
            conditions.push(format!("is_checked_out = {}", !available));
        }

        let where_clause = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };

        let count_query = format!("SELECT COUNT(*) FROM books WHERE {}", where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count = count.bind(param);
        }
        let total = count.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT * FROM books WHERE {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let mut select = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            select = select.bind(param);
        }
        let books = select.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn create(&self, fields: &BookFields, created_by: Uuid) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                title, author, isbn, genre, description, cover_url,
                page_count, published_year, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.author)
        .bind(&fields.isbn)
        .bind(&fields.genre)
        .bind(&fields.description)
        .bind(&fields.cover_url)
        .bind(fields.page_count)
        .bind(fields.published_year)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    async fn update(&self, id: Uuid, fields: &BookFields) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, author = $3, isbn = $4, genre = $5, description = $6,
                cover_url = $7, page_count = $8, published_year = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.author)
        .bind(&fields.isbn)
        .bind(&fields.genre)
        .bind(&fields.description)
        .bind(&fields.cover_url)
        .bind(fields.page_count)
        .bind(fields.published_year)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn update_lending(
        &self,
        id: Uuid,
        expected: LendingExpectation,
        target: LendingState,
    ) -> AppResult<ConditionalUpdate> {
        // The precondition lives in the WHERE clause, so the check and the
        // write are one atomic statement on the store side.
        let updated = match (expected, target) {
            (LendingExpectation::Available, LendingState::CheckedOut { by, at }) => {
                sqlx::query_as::<_, Book>(
                    r#"
                    UPDATE books
                    SET is_checked_out = TRUE, checked_out_by = $2, checked_out_at = $3,
                        updated_at = NOW()
                    WHERE id = $1 AND is_checked_out = FALSE
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(by)
                .bind(at)
                .fetch_optional(&self.pool)
                .await?
            }
            (LendingExpectation::CheckedOutBy(holder), LendingState::Available) => {
                sqlx::query_as::<_, Book>(
                    r#"
                    UPDATE books
                    SET is_checked_out = FALSE, checked_out_by = NULL, checked_out_at = NULL,
                        updated_at = NOW()
                    WHERE id = $1 AND is_checked_out = TRUE AND checked_out_by = $2
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(holder)
                .fetch_optional(&self.pool)
                .await?
            }
            (LendingExpectation::CheckedOutBy(holder), LendingState::CheckedOut { by, at }) => {
                sqlx::query_as::<_, Book>(
                    r#"
                    UPDATE books
                    SET is_checked_out = TRUE, checked_out_by = $3, checked_out_at = $4,
                        updated_at = NOW()
                    WHERE id = $1 AND is_checked_out = TRUE AND checked_out_by = $2
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(holder)
                .bind(by)
                .bind(at)
                .fetch_optional(&self.pool)
                .await?
            }
            (LendingExpectation::Available, LendingState::Available) => {
                sqlx::query_as::<_, Book>(
                    r#"
                    UPDATE books
                    SET updated_at = NOW()
                    WHERE id = $1 AND is_checked_out = FALSE
                    RETURNING *
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        match updated {
            Some(book) => Ok(ConditionalUpdate::Applied(book)),
            None => {
                // Distinguish a lost race from a missing row.
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&self.pool)
                        .await?;
                if exists {
                    Ok(ConditionalUpdate::Conflict)
                } else {
                    Err(AppError::NotFound(format!("Book with id {} not found", id)))
                }
            }
        }
    }

    async fn clear_lending(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET is_checked_out = FALSE, checked_out_by = NULL, checked_out_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn genres(&self) -> AppResult<Vec<String>> {
        let genres = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT genre FROM books WHERE genre IS NOT NULL ORDER BY genre",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    async fn summaries(&self) -> AppResult<Vec<BookSummary>> {
        let summaries = sqlx::query_as::<_, BookSummary>(
            "SELECT id, title, author, is_checked_out, genre FROM books ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }
}
