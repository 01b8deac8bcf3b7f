//! Repository layer for data-store operations
//!
//! Every operation is an async round trip to the shared store; after each
//! await other writers' effects may be visible. The traits are the seam the
//! services depend on, so tests can substitute a fake store.

pub mod books;
pub mod checkouts;
pub mod profiles;

#[cfg(test)]
pub mod memory;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

use books::{BookRepository, PgBookRepository};
use checkouts::{CheckoutRepository, PgCheckoutRepository};
use profiles::{PgProfileRepository, ProfileRepository};

/// Main repository struct bundling the per-collection repositories
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookRepository>,
    pub checkouts: Arc<dyn CheckoutRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Repository {
    /// Create a Postgres-backed repository from the given connection pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(PgBookRepository::new(pool.clone())),
            checkouts: Arc::new(PgCheckoutRepository::new(pool.clone())),
            profiles: Arc::new(PgProfileRepository::new(pool)),
        }
    }
}
