//! Circulation endpoints: checkout, return, history, reconciliation

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::Book,
        checkout::{CheckoutDetails, CirculationAudit, HistoryFilter},
    },
};

use super::CurrentUser;

/// Circulation response with the updated book
#[derive(Serialize, ToSchema)]
pub struct CirculationResponse {
    /// Transition status
    pub status: String,
    /// Book after the transition
    pub book: Book,
}

/// Check a book out to the calling user
#[utoipa::path(
    post,
    path = "/books/{id}/checkout",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book checked out", body = CirculationResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is already checked out")
    )
)]
pub async fn checkout_book(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CirculationResponse>> {
    let book = state.services.circulation.checkout(id, &identity).await?;

    Ok(Json(CirculationResponse {
        status: "checked_out".to_string(),
        book,
    }))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/books/{id}/return",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = CirculationResponse),
        (status = 403, description = "Caller is not the borrower"),
        (status = 404, description = "Book not found or not checked out")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CirculationResponse>> {
    let book = state.services.circulation.return_book(id, &identity).await?;

    Ok(Json(CirculationResponse {
        status: "returned".to_string(),
        book,
    }))
}

/// Lending history, newest first
#[utoipa::path(
    get,
    path = "/checkouts",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(HistoryFilter),
    responses(
        (status = 200, description = "Checkout history", body = Vec<CheckoutDetails>)
    )
)]
pub async fn list_checkouts(
    State(state): State<crate::AppState>,
    CurrentUser(_identity): CurrentUser,
    Query(filter): Query<HistoryFilter>,
) -> AppResult<Json<Vec<CheckoutDetails>>> {
    let history = state.services.circulation.history(&filter).await?;
    Ok(Json(history))
}

/// The calling user's own lending history
#[utoipa::path(
    get,
    path = "/checkouts/mine",
    tag = "circulation",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's checkout history", body = Vec<CheckoutDetails>)
    )
)]
pub async fn my_checkouts(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<Vec<CheckoutDetails>>> {
    let filter = HistoryFilter {
        book_id: None,
        user_id: Some(identity.id),
    };
    let history = state.services.circulation.history(&filter).await?;
    Ok(Json(history))
}

/// Reconcile a book's catalog flag against the ledger
#[utoipa::path(
    get,
    path = "/books/{id}/audit",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Reconciliation report", body = CirculationAudit),
        (status = 403, description = "Caller may not manage the catalog"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn audit_book(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CirculationAudit>> {
    identity.require_mutate_catalog()?;

    let audit = state.services.circulation.verify_consistency(id).await?;
    Ok(Json(audit))
}
