//! AI assistant endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::BookSummary,
    services::assistant::{Categorization, ChatTurn},
};

use super::CurrentUser;

/// Auto-categorize request
#[derive(Deserialize, ToSchema)]
pub struct CategorizeRequest {
    /// Book title
    pub title: String,
    /// Book author
    pub author: String,
}

/// Natural-language search request
#[derive(Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Free-form query, e.g. "a short novel about space politics"
    pub query: String,
}

/// Natural-language search response
#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    /// Books matching the query
    pub matches: Vec<BookSummary>,
}

/// Chat request
#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,
    /// Prior conversation turns, oldest first
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Chat response
#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    /// The assistant's reply
    pub reply: String,
}

/// Suggest a genre and description for a book
#[utoipa::path(
    post,
    path = "/assistant/categorize",
    tag = "assistant",
    security(("bearer_auth" = [])),
    request_body = CategorizeRequest,
    responses(
        (status = 200, description = "Suggested categorization (empty on assistant failure)", body = Categorization)
    )
)]
pub async fn categorize(
    State(state): State<crate::AppState>,
    CurrentUser(_identity): CurrentUser,
    Json(request): Json<CategorizeRequest>,
) -> AppResult<Json<Categorization>> {
    let categorization = state
        .services
        .assistant
        .categorize(&request.title, &request.author)
        .await?;
    Ok(Json(categorization))
}

/// Search the catalog with a natural-language query
#[utoipa::path(
    post,
    path = "/assistant/search",
    tag = "assistant",
    security(("bearer_auth" = [])),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching books (empty on assistant failure)", body = SearchResponse)
    )
)]
pub async fn search(
    State(state): State<crate::AppState>,
    CurrentUser(_identity): CurrentUser,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<SearchResponse>> {
    let matches = state
        .services
        .assistant
        .natural_search(&request.query)
        .await?;
    Ok(Json(SearchResponse { matches }))
}

/// Chat with the library assistant
#[utoipa::path(
    post,
    path = "/assistant/chat",
    tag = "assistant",
    security(("bearer_auth" = [])),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply (apology on assistant failure)", body = ChatResponse)
    )
)]
pub async fn chat(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let reply = state
        .services
        .assistant
        .chat(&identity, &request.message, &request.history)
        .await?;
    Ok(Json(ChatResponse { reply }))
}
