//! Catalog management service
//!
//! All catalog mutation is gated on the caller's capabilities before any
//! repository call; the repositories themselves never re-check.

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFields, BookQuery},
        profile::Identity,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters, newest first
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Distinct genres present in the catalog
    pub async fn genres(&self) -> AppResult<Vec<String>> {
        self.repository.books.genres().await
    }

    /// Create a new book
    pub async fn create_book(&self, identity: &Identity, fields: BookFields) -> AppResult<Book> {
        identity.require_mutate_catalog()?;
        fields.validate()?;

        let book = self.repository.books.create(&fields, identity.id).await?;
        tracing::info!(book_id = %book.id, user_id = %identity.id, "book created");
        Ok(book)
    }

    /// Update a book's bibliographic fields
    pub async fn update_book(
        &self,
        identity: &Identity,
        id: Uuid,
        fields: BookFields,
    ) -> AppResult<Book> {
        identity.require_mutate_catalog()?;
        fields.validate()?;

        self.repository.books.update(id, &fields).await
    }

    /// Delete a book.
    ///
    /// A currently-checked-out book cannot be deleted; closed ledger history
    /// is preserved and simply outlives the book.
    pub async fn delete_book(&self, identity: &Identity, id: Uuid) -> AppResult<()> {
        identity.require_mutate_catalog()?;

        let book = self.repository.books.get_by_id(id).await?;
        if book.is_checked_out {
            return Err(AppError::Conflict(
                "Book is currently checked out and cannot be deleted".to_string(),
            ));
        }

        self.repository.books.delete(id).await?;
        tracing::info!(book_id = %id, user_id = %identity.id, "book deleted");
        Ok(())
    }
}
