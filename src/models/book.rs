//! Book model and lending state types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub page_count: Option<i32>,
    pub published_year: Option<i32>,
    pub is_checked_out: bool,
    pub checked_out_by: Option<Uuid>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Read the lending columns as the circulation state machine state.
    ///
    /// A row with `is_checked_out` set but no borrower violates the catalog
    /// invariant and is reported as `Available` so that it can be claimed
    /// and repaired by the next checkout.
    pub fn lending_state(&self) -> LendingState {
        match (self.is_checked_out, self.checked_out_by, self.checked_out_at) {
            (true, Some(by), Some(at)) => LendingState::CheckedOut { by, at },
            (true, Some(by), None) => LendingState::CheckedOut {
                by,
                at: self.updated_at,
            },
            _ => LendingState::Available,
        }
    }
}

/// Circulation state of a book: the target of a lending write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendingState {
    Available,
    CheckedOut { by: Uuid, at: DateTime<Utc> },
}

/// Precondition of a conditional lending write.
///
/// The store applies the target state only while the row still matches the
/// expectation; a row that has drifted yields a conflict, never a partial
/// write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendingExpectation {
    Available,
    CheckedOutBy(Uuid),
}

impl LendingExpectation {
    /// Whether a row in `state` satisfies this precondition.
    pub fn matches(&self, state: LendingState) -> bool {
        match (self, state) {
            (LendingExpectation::Available, LendingState::Available) => true,
            (LendingExpectation::CheckedOutBy(user), LendingState::CheckedOut { by, .. }) => {
                *user == by
            }
            _ => false,
        }
    }
}

/// Short book representation for lists, prompts and dashboards
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub is_checked_out: bool,
    pub genre: Option<String>,
}

/// Catalog query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive text search over title, author, ISBN and genre
    pub search: Option<String>,
    /// Exact genre filter
    pub genre: Option<String>,
    /// When set, keep only available (`true`) or checked-out (`false`) books
    pub available: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Bibliographic fields for catalog create and update requests
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookFields {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    #[validate(range(min = 1, message = "Page count must be positive"))]
    pub page_count: Option<i32>,
    pub published_year: Option<i32>,
}
