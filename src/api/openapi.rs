//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{assistant, books, checkouts, health, profiles, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MiniLibrary API",
        version = "0.1.0",
        description = "Library Circulation Server REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::list_genres,
        // Circulation
        checkouts::checkout_book,
        checkouts::return_book,
        checkouts::list_checkouts,
        checkouts::my_checkouts,
        checkouts::audit_book,
        // Profiles
        profiles::me,
        profiles::list_profiles,
        profiles::update_role,
        // Assistant
        assistant::categorize,
        assistant::search,
        assistant::chat,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookQuery,
            crate::models::book::BookFields,
            // Circulation
            crate::models::checkout::CheckoutRecord,
            crate::models::checkout::CheckoutDetails,
            crate::models::checkout::HistoryFilter,
            crate::models::checkout::CirculationAudit,
            checkouts::CirculationResponse,
            // Profiles
            crate::models::profile::Profile,
            crate::models::profile::ProfileSummary,
            crate::models::profile::Role,
            crate::models::profile::Capabilities,
            crate::models::profile::UpdateRole,
            // Assistant
            crate::services::assistant::Categorization,
            crate::services::assistant::ChatRole,
            crate::services::assistant::ChatTurn,
            assistant::CategorizeRequest,
            assistant::SearchRequest,
            assistant::SearchResponse,
            assistant::ChatRequest,
            assistant::ChatResponse,
            // Stats
            crate::services::stats::DashboardStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "circulation", description = "Checkout and return"),
        (name = "profiles", description = "Profiles and roles"),
        (name = "assistant", description = "AI-assisted search, cataloging and chat"),
        (name = "stats", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
