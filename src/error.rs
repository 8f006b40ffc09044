//! Error types and their HTTP mapping
//!
//! `StoreError` covers everything that can go wrong below the handlers
//! (redb, JSON encoding, code generation). `AppError` is what handlers
//! return; it maps each failure to the status code and JSON body the API
//! promises, and never leaks backend detail to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("malformed document: {0}")]
    Serde(#[from] serde_json::Error),

    /// The code index points at a user whose document no longer holds the code.
    #[error("code index out of sync for code {0}")]
    DanglingIndex(String),

    #[error("could not generate a unique short code after {0} attempts")]
    CodeSpaceExhausted(usize),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid url")]
    InvalidUrl,

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to build spreadsheet: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl AppError {
    pub fn url_not_found() -> Self {
        Self::NotFound("Url not found")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidUrl => (StatusCode::BAD_REQUEST, "invalid url"),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, *message),
            AppError::Store(_) | AppError::Export(_) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
