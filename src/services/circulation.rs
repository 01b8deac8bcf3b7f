//! Circulation service: the checkout/return state machine
//!
//! A book is either `Available` or `CheckedOut(by)`. The transition into
//! `CheckedOut` is guarded by a conditional update on the books collection;
//! that guard is the only defense against two borrowers claiming the same
//! copy, so no other code path may set the lending columns directly.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, LendingExpectation, LendingState},
        checkout::{CheckoutDetails, CirculationAudit, HistoryFilter},
        profile::Identity,
    },
    repository::{books::ConditionalUpdate, Repository},
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
}

impl CirculationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check a book out to the calling principal.
    ///
    /// The catalog write must win the compare-and-swap before the ledger
    /// entry is appended; a lost race leaves no trace in either collection.
    pub async fn checkout(&self, book_id: Uuid, identity: &Identity) -> AppResult<Book> {
        let now = chrono::Utc::now();
        let claim = LendingState::CheckedOut {
            by: identity.id,
            at: now,
        };

        match self
            .repository
            .books
            .update_lending(book_id, LendingExpectation::Available, claim)
            .await?
        {
            ConditionalUpdate::Applied(book) => {
                self.repository
                    .checkouts
                    .open(book_id, identity.id, now)
                    .await?;
                tracing::info!(book_id = %book_id, user_id = %identity.id, "book checked out");
                Ok(book)
            }
            ConditionalUpdate::Conflict => Err(AppError::AlreadyCheckedOut),
        }
    }

    /// Return a book.
    ///
    /// Self-service for the current borrower; principals holding catalog
    /// rights may return on behalf of someone else, in which case the
    /// borrower's own ledger record is the one closed.
    pub async fn return_book(&self, book_id: Uuid, identity: &Identity) -> AppResult<Book> {
        let book = self.repository.books.get_by_id(book_id).await?;

        let borrower = match book.checked_out_by {
            Some(borrower) => borrower,
            None => {
                return Err(AppError::NotFound(format!(
                    "Book {} is not checked out",
                    book_id
                )))
            }
        };

        if borrower != identity.id && !identity.capabilities().can_mutate_catalog {
            return Err(AppError::Authorization(
                "Only the current borrower or library staff may return this book".to_string(),
            ));
        }

        let book = self.repository.books.clear_lending(book_id).await?;
        self.repository
            .checkouts
            .close(book_id, borrower, chrono::Utc::now())
            .await?;
        tracing::info!(book_id = %book_id, user_id = %borrower, "book returned");
        Ok(book)
    }

    /// Lending history, newest first, optionally filtered by book or user.
    pub async fn history(&self, filter: &HistoryFilter) -> AppResult<Vec<CheckoutDetails>> {
        self.repository.checkouts.history(filter).await
    }

    /// Reconcile a book's catalog flag against the ledger.
    ///
    /// The two lending writes are not atomic, so a crash between them can
    /// leave the stores disagreeing; this check makes the window observable
    /// instead of implicit.
    pub async fn verify_consistency(&self, book_id: Uuid) -> AppResult<CirculationAudit> {
        let book = self.repository.books.get_by_id(book_id).await?;
        let open_record = self.repository.checkouts.find_open_by_book(book_id).await?;

        let consistent = match (book.checked_out_by, &open_record) {
            (Some(borrower), Some(record)) => book.is_checked_out && record.user_id == borrower,
            (None, None) => !book.is_checked_out,
            _ => false,
        };

        Ok(CirculationAudit {
            book_id,
            catalog_checked_out: book.is_checked_out,
            catalog_borrower: book.checked_out_by,
            open_record,
            consistent,
        })
    }
}
