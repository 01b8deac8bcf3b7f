//! Checkout ledger model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::book::BookSummary;
use super::profile::ProfileSummary;

/// One lending event. Records are appended at checkout time, closed at
/// return time and never mutated otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CheckoutRecord {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub checked_out_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CheckoutRecord {
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Checkout record joined with book and borrower summaries for display.
/// Both joins are optional: history outlives book deletion.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutDetails {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub checked_out_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub book: Option<BookSummary>,
    pub borrower: Option<ProfileSummary>,
}

/// History query parameters
#[derive(Debug, Default, Clone, Copy, Deserialize, IntoParams, ToSchema)]
pub struct HistoryFilter {
    pub book_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Result of reconciling a book's catalog flag against the ledger.
///
/// The catalog flip and the ledger write are two separate statements, so a
/// crash between them can leave the two stores disagreeing; this report
/// makes that window observable.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CirculationAudit {
    pub book_id: Uuid,
    pub catalog_checked_out: bool,
    pub catalog_borrower: Option<Uuid>,
    pub open_record: Option<CheckoutRecord>,
    pub consistent: bool,
}
