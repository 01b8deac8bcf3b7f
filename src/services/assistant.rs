//! AI assistant service
//!
//! Wraps a single request/response text-generation capability and the three
//! features built on it: auto-categorization, natural-language search and
//! chat. The assistant is read-only with respect to catalog and circulation
//! state; every transport or parse failure maps to a defined fallback.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::AssistantConfig,
    error::{AppError, AppResult},
    models::{book::BookSummary, profile::Identity},
    repository::Repository,
};

const CHAT_FALLBACK: &str =
    "Sorry, I'm having trouble thinking right now. Please try again in a moment!";

/// Suggested genre and description for a book
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Categorization {
    pub genre: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One prior turn of the chat conversation, supplied by the client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Clone)]
pub struct AssistantService {
    repository: Repository,
    http: reqwest::Client,
    config: AssistantConfig,
}

impl AssistantService {
    pub fn new(repository: Repository, config: AssistantConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();
        Self {
            repository,
            http,
            config,
        }
    }

    /// Send a prompt to the text-generation endpoint and return its reply.
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Internal("Assistant API key is not configured".to_string()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Assistant request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "Assistant returned status {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Network(format!("Assistant response unreadable: {}", e)))?;

        let text = payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::Network("Assistant response had no text".to_string()))?;

        Ok(text.trim().to_string())
    }

    /// Suggest a genre and description for a book.
    /// Falls back to an empty categorization on any failure.
    pub async fn categorize(&self, title: &str, author: &str) -> AppResult<Categorization> {
        let prompt = format!(
            "You are a librarian assistant. Given a book title and author, provide a genre \
             classification and a 2-sentence description.\n\n\
             Book: \"{}\" by {}\n\n\
             Respond ONLY with valid JSON in this exact format (no markdown, no code fences):\n\
             {{\"genre\": \"Genre Name\", \"description\": \"A brief 2-sentence description of the book.\"}}",
            title, author
        );

        match self.generate(&prompt).await {
            Ok(text) => match parse_categorization(&text) {
                Some(categorization) => Ok(categorization),
                None => {
                    tracing::warn!("assistant categorization response did not parse");
                    Ok(Categorization::default())
                }
            },
            Err(e) => {
                tracing::warn!("assistant categorization failed: {}", e);
                Ok(Categorization::default())
            }
        }
    }

    /// Match catalog books against a natural-language query.
    /// Falls back to an empty match set on any failure.
    pub async fn natural_search(&self, query: &str) -> AppResult<Vec<BookSummary>> {
        let summaries = self.repository.books.summaries().await?;

        let book_list = summaries
            .iter()
            .map(|b| {
                format!(
                    "ID:{} | \"{}\" by {} | Genre: {} | {}",
                    b.id,
                    b.title,
                    b.author,
                    b.genre.as_deref().unwrap_or("Unknown"),
                    if b.is_checked_out { "Checked Out" } else { "Available" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "You are a smart library search assistant. Given a user's natural language query \
             and a list of books, return the IDs of books that best match the query.\n\n\
             User query: \"{}\"\n\n\
             Available books:\n{}\n\n\
             Respond ONLY with valid JSON in this exact format (no markdown, no code fences):\n\
             {{\"matched_ids\": [\"id1\", \"id2\"]}}\n\n\
             If no books match, return {{\"matched_ids\": []}}.",
            query, book_list
        );

        let matched_ids = match self.generate(&prompt).await {
            Ok(text) => parse_matched_ids(&text).unwrap_or_else(|| {
                tracing::warn!("assistant search response did not parse");
                Vec::new()
            }),
            Err(e) => {
                tracing::warn!("assistant search failed: {}", e);
                Vec::new()
            }
        };

        Ok(summaries
            .into_iter()
            .filter(|b| matched_ids.contains(&b.id))
            .collect())
    }

    /// Chat with the library assistant.
    /// Falls back to a fixed apology on any failure.
    pub async fn chat(
        &self,
        identity: &Identity,
        message: &str,
        history: &[ChatTurn],
    ) -> AppResult<String> {
        let summaries = self.repository.books.summaries().await?;

        let book_list = summaries
            .iter()
            .map(|b| {
                format!(
                    "- \"{}\" by {} ({}) - {}",
                    b.title,
                    b.author,
                    b.genre.as_deref().unwrap_or("Unknown"),
                    if b.is_checked_out { "Checked Out" } else { "Available" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let recent = history
            .iter()
            .rev()
            .take(6)
            .rev()
            .map(|turn| {
                let speaker = match turn.role {
                    ChatRole::User => "User",
                    ChatRole::Model => "Libby",
                };
                format!("{}: {}", speaker, turn.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "You are a friendly and helpful library assistant for MiniLibrary. Your name is Libby.\n\
             You help users find books, get recommendations, and answer questions about the library.\n\
             Be concise but friendly. Use emojis sparingly.\n\n\
             Current user: {}\n\n\
             Library inventory ({} books):\n{}\n\n\
             Previous conversation:\n{}\n\n\
             User: {}\n\n\
             Respond naturally as Libby the library assistant:",
            identity.display_name(),
            summaries.len(),
            book_list,
            recent,
            message
        );

        match self.generate(&prompt).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                tracing::warn!("assistant chat failed: {}", e);
                Ok(CHAT_FALLBACK.to_string())
            }
        }
    }
}

/// Strip markdown code fences the model sometimes wraps JSON in.
fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn parse_categorization(text: &str) -> Option<Categorization> {
    serde_json::from_str(&strip_code_fences(text)).ok()
}

fn parse_matched_ids(text: &str) -> Option<Vec<Uuid>> {
    let value: serde_json::Value = serde_json::from_str(&strip_code_fences(text)).ok()?;
    let ids = value.get("matched_ids")?.as_array()?;
    Some(
        ids.iter()
            .filter_map(|id| id.as_str())
            .filter_map(|id| id.parse().ok())
            .collect(),
    )
}
