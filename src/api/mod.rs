//! API handlers for the MiniLibrary REST endpoints

pub mod assistant;
pub mod books;
pub mod checkouts;
pub mod health;
pub mod openapi;
pub mod profiles;
pub mod stats;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError, models::profile::Identity, services::accounts::PrincipalClaims, AppState,
};

/// Claims issued by the external authentication collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Principal id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl AuthClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

/// Extractor resolving the bearer token to an identity.
///
/// Identity resolution happens before any handler body runs, so gated
/// actions never execute with an undetermined authorization state. The role
/// is read from the profiles collection on every request.
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        // Check for Bearer token
        if !auth_header.starts_with("Bearer ") {
            return Err(AppError::Authentication(
                "Invalid authorization header format".to_string(),
            ));
        }

        let token = &auth_header[7..];

        let claims = AuthClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let id: Uuid = claims
            .sub
            .parse()
            .map_err(|_| AppError::Authentication("Invalid principal id in token".to_string()))?;

        let identity = state
            .services
            .accounts
            .identify(&PrincipalClaims {
                id,
                email: claims.email,
                full_name: claims.name,
                avatar_url: claims.picture,
            })
            .await?;

        Ok(CurrentUser(identity))
    }
}
