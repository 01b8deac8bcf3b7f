//! API integration tests
//!
//! These run against a live server with the default development secret.

use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

use minilibrary_server::api::AuthClaims;

const BASE_URL: &str = "http://localhost:8080/api/v1";
const DEV_SECRET: &str = "change-this-secret-in-production";

/// Mint a bearer token for a fresh principal
fn make_token(full_name: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = AuthClaims {
        sub: Uuid::new_v4().to_string(),
        email: Some(format!("{}@example.com", full_name.to_lowercase())),
        name: Some(full_name.to_string()),
        picture: None,
        iat: now,
        exp: now + 3600,
    };
    claims.create_token(DEV_SECRET).expect("Failed to mint token")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_books_require_authentication() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_create_books() {
    let client = Client::new();
    let token = make_token("Morgan");

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "The Dispossessed",
            "author": "Ursula K. Le Guin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_first_authentication_creates_member_profile() {
    let client = Client::new();
    let token = make_token("Quinn");

    let response = client
        .get(format!("{}/profiles/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["role"], "member");
}

#[tokio::test]
#[ignore]
async fn test_double_checkout_conflicts() {
    let client = Client::new();
    let reader = make_token("Alex");
    let rival = make_token("Brett");

    // Any available book will do
    let books: Value = client
        .get(format!("{}/books?available=true&per_page=1", BASE_URL))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to list books")
        .json()
        .await
        .expect("Failed to parse book list");

    let Some(book_id) = books["books"][0]["id"].as_str() else {
        eprintln!("No available book in the catalog, skipping");
        return;
    };

    let first = client
        .post(format!("{}/books/{}/checkout", BASE_URL, book_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send checkout");
    assert!(first.status().is_success());

    let second = client
        .post(format!("{}/books/{}/checkout", BASE_URL, book_id))
        .bearer_auth(&rival)
        .send()
        .await
        .expect("Failed to send rival checkout");
    assert_eq!(second.status(), 409);

    // Clean up: return the book
    let returned = client
        .post(format!("{}/books/{}/return", BASE_URL, book_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send return");
    assert!(returned.status().is_success());
}
