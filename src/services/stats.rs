//! Dashboard statistics service

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, repository::Repository};

/// Dashboard aggregates over the catalog
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total: i64,
    pub checked_out: i64,
    pub available: i64,
    pub genre_counts: BTreeMap<String, i64>,
    pub top_genre: Option<String>,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Compute dashboard aggregates from catalog summaries
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let summaries = self.repository.books.summaries().await?;

        let total = summaries.len() as i64;
        let checked_out = summaries.iter().filter(|b| b.is_checked_out).count() as i64;

        let mut genre_counts: BTreeMap<String, i64> = BTreeMap::new();
        for book in &summaries {
            if let Some(ref genre) = book.genre {
                *genre_counts.entry(genre.clone()).or_insert(0) += 1;
            }
        }

        let top_genre = genre_counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(genre, _)| genre.clone());

        Ok(DashboardStats {
            total,
            checked_out,
            available: total - checked_out,
            genre_counts,
            top_genre,
        })
    }
}
