//! In-memory fake store for unit tests
//!
//! Mimics the remote store's semantics: each call is an independent round
//! trip, and the conditional lending update checks its precondition and
//! applies the write as one atomic step, exactly like the WHERE-guarded
//! UPDATE it stands in for.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFields, BookQuery, BookSummary, LendingExpectation, LendingState},
        checkout::{CheckoutDetails, CheckoutRecord, HistoryFilter},
        profile::{Profile, Role},
    },
};

use super::{
    books::{BookRepository, ConditionalUpdate},
    checkouts::CheckoutRepository,
    profiles::ProfileRepository,
    Repository,
};

/// Build a repository backed entirely by in-memory fakes, returning handles
/// for seeding and inspection.
pub fn repository() -> (
    Repository,
    Arc<InMemoryBooks>,
    Arc<InMemoryCheckouts>,
    Arc<InMemoryProfiles>,
) {
    let books = Arc::new(InMemoryBooks::default());
    let checkouts = Arc::new(InMemoryCheckouts::default());
    let profiles = Arc::new(InMemoryProfiles::default());
    let repository = Repository {
        books: books.clone(),
        checkouts: checkouts.clone(),
        profiles: profiles.clone(),
    };
    (repository, books, checkouts, profiles)
}

pub fn sample_book(title: &str) -> Book {
    let now = Utc::now();
    Book {
        id: Uuid::new_v4(),
        title: title.to_string(),
        author: "Test Author".to_string(),
        isbn: None,
        genre: None,
        description: None,
        cover_url: None,
        page_count: None,
        published_year: None,
        is_checked_out: false,
        checked_out_by: None,
        checked_out_at: None,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_profile(role: Role) -> Profile {
    let now = Utc::now();
    Profile {
        id: Uuid::new_v4(),
        email: Some("reader@example.com".to_string()),
        full_name: Some("Test Reader".to_string()),
        avatar_url: None,
        role,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct InMemoryBooks {
    rows: Mutex<HashMap<Uuid, Book>>,
}

impl InMemoryBooks {
    pub fn seed(&self, book: Book) -> Book {
        self.rows.lock().unwrap().insert(book.id, book.clone());
        book
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Book> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl BookRepository for InMemoryBooks {
    async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let rows = self.rows.lock().unwrap();
        let mut books: Vec<Book> = rows
            .values()
            .filter(|b| {
                if let Some(ref s) = query.search {
                    let s = s.to_lowercase();
                    let hit = b.title.to_lowercase().contains(&s)
                        || b.author.to_lowercase().contains(&s)
                        || b.isbn.as_deref().is_some_and(|v| v.to_lowercase().contains(&s))
                        || b.genre.as_deref().is_some_and(|v| v.to_lowercase().contains(&s));
                    if !hit {
                        return false;
                    }
                }
                if let Some(ref g) = query.genre {
                    if b.genre.as_deref() != Some(g.as_str()) {
                        return false;
                    }
                }
                if let Some(available) = query.available {
                    if b.is_checked_out == available {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = books.len() as i64;
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let books = books
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .collect();

        Ok((books, total))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        self.snapshot(id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn create(&self, fields: &BookFields, created_by: Uuid) -> AppResult<Book> {
        let mut book = sample_book(&fields.title);
        book.author = fields.author.clone();
        book.isbn = fields.isbn.clone();
        book.genre = fields.genre.clone();
        book.description = fields.description.clone();
        book.cover_url = fields.cover_url.clone();
        book.page_count = fields.page_count;
        book.published_year = fields.published_year;
        book.created_by = Some(created_by);
        Ok(self.seed(book))
    }

    async fn update(&self, id: Uuid, fields: &BookFields) -> AppResult<Book> {
        let mut rows = self.rows.lock().unwrap();
        let book = rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;
        book.title = fields.title.clone();
        book.author = fields.author.clone();
        book.isbn = fields.isbn.clone();
        book.genre = fields.genre.clone();
        book.description = fields.description.clone();
        book.cover_url = fields.cover_url.clone();
        book.page_count = fields.page_count;
        book.published_year = fields.published_year;
        book.updated_at = Utc::now();
        Ok(book.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn update_lending(
        &self,
        id: Uuid,
        expected: LendingExpectation,
        target: LendingState,
    ) -> AppResult<ConditionalUpdate> {
        let mut rows = self.rows.lock().unwrap();
        let book = rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if !expected.matches(book.lending_state()) {
            return Ok(ConditionalUpdate::Conflict);
        }

        match target {
            LendingState::Available => {
                book.is_checked_out = false;
                book.checked_out_by = None;
                book.checked_out_at = None;
            }
            LendingState::CheckedOut { by, at } => {
                book.is_checked_out = true;
                book.checked_out_by = Some(by);
                book.checked_out_at = Some(at);
            }
        }
        book.updated_at = Utc::now();
        Ok(ConditionalUpdate::Applied(book.clone()))
    }

    async fn clear_lending(&self, id: Uuid) -> AppResult<Book> {
        let mut rows = self.rows.lock().unwrap();
        let book = rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;
        book.is_checked_out = false;
        book.checked_out_by = None;
        book.checked_out_at = None;
        book.updated_at = Utc::now();
        Ok(book.clone())
    }

    async fn genres(&self) -> AppResult<Vec<String>> {
        let rows = self.rows.lock().unwrap();
        let mut genres: Vec<String> = rows.values().filter_map(|b| b.genre.clone()).collect();
        genres.sort();
        genres.dedup();
        Ok(genres)
    }

    async fn summaries(&self) -> AppResult<Vec<BookSummary>> {
        let rows = self.rows.lock().unwrap();
        let mut summaries: Vec<BookSummary> = rows
            .values()
            .map(|b| BookSummary {
                id: b.id,
                title: b.title.clone(),
                author: b.author.clone(),
                is_checked_out: b.is_checked_out,
                genre: b.genre.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(summaries)
    }
}

#[derive(Default)]
pub struct InMemoryCheckouts {
    rows: Mutex<Vec<CheckoutRecord>>,
}

impl InMemoryCheckouts {
    pub fn records(&self) -> Vec<CheckoutRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn seed(&self, record: CheckoutRecord) {
        self.rows.lock().unwrap().push(record);
    }
}

#[async_trait]
impl CheckoutRepository for InMemoryCheckouts {
    async fn open(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        at: chrono::DateTime<Utc>,
    ) -> AppResult<CheckoutRecord> {
        let record = CheckoutRecord {
            id: Uuid::new_v4(),
            book_id,
            user_id,
            checked_out_at: at,
            returned_at: None,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn close(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        at: chrono::DateTime<Utc>,
    ) -> AppResult<CheckoutRecord> {
        let mut rows = self.rows.lock().unwrap();
        let record = rows
            .iter_mut()
            .filter(|r| r.book_id == book_id && r.user_id == user_id && r.is_open())
            .max_by_key(|r| r.checked_out_at)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No open checkout record for book {} and user {}",
                    book_id, user_id
                ))
            })?;
        record.returned_at = Some(at);
        Ok(record.clone())
    }

    async fn history(&self, filter: &HistoryFilter) -> AppResult<Vec<CheckoutDetails>> {
        let rows = self.rows.lock().unwrap();
        let mut records: Vec<CheckoutDetails> = rows
            .iter()
            .filter(|r| {
                filter.book_id.map_or(true, |id| r.book_id == id)
                    && filter.user_id.map_or(true, |id| r.user_id == id)
            })
            .map(|r| CheckoutDetails {
                id: r.id,
                book_id: r.book_id,
                user_id: r.user_id,
                checked_out_at: r.checked_out_at,
                returned_at: r.returned_at,
                book: None,
                borrower: None,
            })
            .collect();
        records.sort_by(|a, b| b.checked_out_at.cmp(&a.checked_out_at));
        Ok(records)
    }

    async fn find_open_by_book(&self, book_id: Uuid) -> AppResult<Option<CheckoutRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.book_id == book_id && r.is_open())
            .max_by_key(|r| r.checked_out_at)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryProfiles {
    rows: Mutex<HashMap<Uuid, Profile>>,
}

impl InMemoryProfiles {
    pub fn seed(&self, profile: Profile) -> Profile {
        self.rows
            .lock()
            .unwrap()
            .insert(profile.id, profile.clone());
        profile
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfiles {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Profile>> {
        let rows = self.rows.lock().unwrap();
        let mut profiles: Vec<Profile> = rows.values().cloned().collect();
        profiles.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(profiles)
    }

    async fn ensure(
        &self,
        id: Uuid,
        email: Option<String>,
        full_name: Option<String>,
        avatar_url: Option<String>,
    ) -> AppResult<Profile> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let profile = match rows.get_mut(&id) {
            Some(p) => {
                if email.is_some() {
                    p.email = email;
                }
                if full_name.is_some() {
                    p.full_name = full_name;
                }
                p.updated_at = now;
                p.clone()
            }
            None => {
                let p = Profile {
                    id,
                    email,
                    full_name,
                    avatar_url,
                    role: Role::Member,
                    created_at: now,
                    updated_at: now,
                };
                rows.insert(id, p.clone());
                p
            }
        };
        Ok(profile)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> AppResult<Profile> {
        let mut rows = self.rows.lock().unwrap();
        let profile = rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Profile with id {} not found", id)))?;
        profile.role = role;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}

// The conditional update is the one synchronization primitive circulation
// depends on, so it gets exercised in isolation here.
#[cfg(test)]
mod tests {
    use super::*;

    fn claim(by: Uuid) -> LendingState {
        LendingState::CheckedOut {
            by,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn conditional_update_applies_when_the_expectation_holds() {
        let books = InMemoryBooks::default();
        let book = books.seed(sample_book("Dune"));
        let reader = Uuid::new_v4();

        let outcome = books
            .update_lending(book.id, LendingExpectation::Available, claim(reader))
            .await
            .unwrap();

        match outcome {
            ConditionalUpdate::Applied(updated) => {
                assert!(updated.is_checked_out);
                assert_eq!(updated.checked_out_by, Some(reader));
            }
            ConditionalUpdate::Conflict => panic!("expected the write to apply"),
        }
    }

    #[tokio::test]
    async fn interleaved_writers_get_exactly_one_application() {
        let books = InMemoryBooks::default();
        let book = books.seed(sample_book("Dune"));
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let (a, b) = tokio::join!(
            books.update_lending(book.id, LendingExpectation::Available, claim(first)),
            books.update_lending(book.id, LendingExpectation::Available, claim(second)),
        );

        let applied = [a.unwrap(), b.unwrap()]
            .into_iter()
            .filter(|o| matches!(o, ConditionalUpdate::Applied(_)))
            .count();
        assert_eq!(applied, 1);
    }

    #[tokio::test]
    async fn conditional_update_conflicts_against_a_stale_expectation() {
        let books = InMemoryBooks::default();
        let book = books.seed(sample_book("Dune"));
        let holder = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        books
            .update_lending(book.id, LendingExpectation::Available, claim(holder))
            .await
            .unwrap();

        // Wrong holder in the expectation: nothing must change.
        let outcome = books
            .update_lending(
                book.id,
                LendingExpectation::CheckedOutBy(stranger),
                LendingState::Available,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, ConditionalUpdate::Conflict));
        assert_eq!(books.snapshot(book.id).unwrap().checked_out_by, Some(holder));

        // Right holder: the release applies.
        let outcome = books
            .update_lending(
                book.id,
                LendingExpectation::CheckedOutBy(holder),
                LendingState::Available,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, ConditionalUpdate::Applied(_)));
        assert!(!books.snapshot(book.id).unwrap().is_checked_out);
    }

    #[tokio::test]
    async fn conditional_update_on_a_missing_row_is_not_found() {
        let books = InMemoryBooks::default();

        let result = books
            .update_lending(
                Uuid::new_v4(),
                LendingExpectation::Available,
                claim(Uuid::new_v4()),
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
