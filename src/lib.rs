//! MiniLibrary Circulation Server
//!
//! A Rust implementation of the MiniLibrary circulation core, providing a
//! REST JSON API for catalog browsing, book lending and return, role-gated
//! administration and AI-assisted search.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
