//! Book (catalog) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book::{Book, BookFields, BookQuery},
};

use super::CurrentUser;

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of books
    pub books: Vec<T>,
    /// Total number of matching books
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Books per page
    pub per_page: i64,
}

/// List books with search and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "List of books", body = PaginatedResponse<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    CurrentUser(_identity): CurrentUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let (books, total) = state.services.catalog.search(&query).await?;

    Ok(Json(PaginatedResponse {
        books,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    CurrentUser(_identity): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookFields,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Caller may not manage the catalog")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
    Json(fields): Json<BookFields>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.catalog.create_book(&identity, fields).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a book's bibliographic fields
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = BookFields,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 403, description = "Caller may not manage the catalog"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
    Json(fields): Json<BookFields>,
) -> AppResult<Json<Book>> {
    let updated = state
        .services
        .catalog
        .update_book(&identity, id, fields)
        .await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Caller may not manage the catalog"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is currently checked out")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the distinct genres present in the catalog
#[utoipa::path(
    get,
    path = "/books/genres",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sorted genre list", body = Vec<String>)
    )
)]
pub async fn list_genres(
    State(state): State<crate::AppState>,
    CurrentUser(_identity): CurrentUser,
) -> AppResult<Json<Vec<String>>> {
    let genres = state.services.catalog.genres().await?;
    Ok(Json(genres))
}
