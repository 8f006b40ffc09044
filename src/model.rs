//! Data models for the URL shortener
//!
//! This module defines the stored documents (one `UserUrlCollection` per user,
//! owning an ordered list of `UrlEntry` values) and the request/response
//! bodies of the HTTP API. All JSON field names are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single shortened URL owned by a user
///
/// Entries have no independent existence: they live inside the
/// `urlArray` of exactly one [`UserUrlCollection`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UrlEntry {
    /// Short code (e.g. "V1StGXR8_Z"), unique across all users
    pub short_url: String,

    /// The validated target URL
    pub original_url: String,

    /// Number of successful redirects through this code
    #[serde(default)]
    pub visit_count: u64,
}

impl UrlEntry {
    pub fn new(short_url: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            short_url: short_url.into(),
            original_url: original_url.into(),
            visit_count: 0,
        }
    }
}

/// The per-user document
///
/// Created lazily on the user's first short URL and never deleted, even
/// when `url_array` becomes empty.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserUrlCollection {
    /// Opaque identity of the owning user
    pub user_id: String,

    /// Entries in creation order
    #[serde(default)]
    pub url_array: Vec<UrlEntry>,

    pub created_at: DateTime<Utc>,

    /// Bumped on every append or removal
    pub updated_at: DateTime<Utc>,
}

impl UserUrlCollection {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            url_array: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn find(&self, code: &str) -> Option<&UrlEntry> {
        self.url_array.iter().find(|entry| entry.short_url == code)
    }

    fn find_mut(&mut self, code: &str) -> Option<&mut UrlEntry> {
        self.url_array.iter_mut().find(|entry| entry.short_url == code)
    }

    pub fn push(&mut self, entry: UrlEntry) {
        self.url_array.push(entry);
        self.updated_at = Utc::now();
    }

    /// Removes the entry with the given code, returning it if present.
    pub fn remove(&mut self, code: &str) -> Option<UrlEntry> {
        let position = self.url_array.iter().position(|entry| entry.short_url == code)?;
        self.updated_at = Utc::now();
        Some(self.url_array.remove(position))
    }

    /// Bumps the visit counter of `code` to at least `previous_count + 1`.
    ///
    /// Returns the new count, or `None` when no entry carries that code.
    pub fn record_visit(&mut self, code: &str, previous_count: u64) -> Option<u64> {
        let entry = self.find_mut(code)?;
        entry.visit_count = entry.visit_count.max(previous_count) + 1;
        Some(entry.visit_count)
    }
}

/// Request payload for creating a new short URL
///
/// # Example
/// ```json
/// { "url": "https://example.com/very/long/url" }
/// ```
#[derive(Deserialize, Debug)]
pub struct CreateRequest {
    /// The URL to shorten; a missing field fails validation like a bad URL
    #[serde(default)]
    pub url: String,
}

/// Response returned after creating a short URL
///
/// # Example
/// ```json
/// { "shortUrl": "http://localhost:8080/url/V1StGXR8_Z" }
/// ```
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    /// Configured prefix followed by the generated code
    pub short_url: String,
}

/// Body of `GET /history`
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub url_array: Vec<UrlEntry>,
}

/// Body of a successful `DELETE /delete/{id}`
#[derive(Serialize, Deserialize, Debug)]
pub struct DeleteResponse {
    pub ok: bool,
}
