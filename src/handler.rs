//! HTTP request handlers for the URL shortener API
//!
//! This module implements the five operations of the service:
//! - Redirecting a short code to its original URL (and counting the visit)
//! - Listing the caller's URLs
//! - Creating a short URL
//! - Deleting one of the caller's URLs
//! - Exporting the caller's URLs to a spreadsheet

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;

use crate::database::AppState;
use crate::error::AppError;
use crate::export::{export_rows, render_workbook, XLSX_CONTENT_DISPOSITION, XLSX_CONTENT_TYPE};
use crate::middleware::AuthUser;
use crate::model::{CreateRequest, CreateResponse, DeleteResponse, HistoryResponse};
use crate::shortcode::{generate_code, is_valid_url};
use crate::store::UrlStore;

/// Redirects a short code to its original URL
///
/// Public endpoint. The code is looked up across every user's collection.
/// The visit is counted on a separate blocking task so that a slow or
/// failing write never delays or breaks the redirect.
///
/// # Response
///
/// - **302 Found** - `Location` set to the original URL
/// - **404 Not Found** - `{"error": "Url not found"}`, nothing is written
pub async fn redirect_url(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let entry = state
        .store
        .find_entry(&code)?
        .ok_or_else(AppError::url_not_found)?;

    let response = (
        StatusCode::FOUND,
        [(header::LOCATION, entry.original_url)],
    )
        .into_response();

    spawn_visit_count(state.store.clone(), code, entry.visit_count);
    Ok(response)
}

/// Counts one visit of `code` in the background.
///
/// Failures are logged and dropped.
fn spawn_visit_count(store: UrlStore, code: String, previous_count: u64) {
    tokio::task::spawn_blocking(move || {
        match store.increment_visit_count(&code, previous_count) {
            Ok(Some(count)) => tracing::debug!(code = %code, count, "visit counted"),
            Ok(None) => tracing::warn!(code = %code, "visit not counted: url not found"),
            Err(err) => tracing::error!(code = %code, error = %err, "failed to count visit"),
        }
    });
}

/// Lists the caller's URLs in creation order
///
/// # Response
///
/// - **200 OK** - `{"urlArray": [...]}`, empty when the user never created one
pub async fn list_history(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<HistoryResponse>, AppError> {
    let url_array = state
        .store
        .find_collection(&user_id)?
        .map(|collection| collection.url_array)
        .unwrap_or_default();

    Ok(Json(HistoryResponse { url_array }))
}

/// Creates a new short URL for the caller
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/very/long/url" }
/// ```
///
/// # Response
///
/// - **200 OK** - `{"shortUrl": "<prefix><code>"}`
/// - **400 Bad Request** - `{"error": "invalid url"}`, nothing is written.
///   Bodies that are not JSON, or whose `url` is not a string, get the same
///   answer.
pub async fn create_short_url(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<Json<CreateResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(user_id = %user_id, error = %rejection, "unreadable create body");
        AppError::InvalidUrl
    })?;
    if !is_valid_url(&payload.url) {
        return Err(AppError::InvalidUrl);
    }

    let entry = state
        .store
        .append_entry(&user_id, &payload.url, generate_code)?;
    tracing::info!(user_id = %user_id, code = %entry.short_url, "short url created");

    Ok(Json(CreateResponse {
        short_url: state.settings.short_url(&entry.short_url),
    }))
}

/// Deletes one of the caller's URLs
///
/// Codes owned by other users are reported exactly like unknown codes.
///
/// # Response
///
/// - **200 OK** - `{"ok": true}`
/// - **404 Not Found** - `{"error": "Url not found"}`
pub async fn delete_short_url(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<DeleteResponse>, AppError> {
    if !state.store.remove_entry(&user_id, &code)? {
        return Err(AppError::url_not_found());
    }
    tracing::info!(user_id = %user_id, code = %code, "short url deleted");

    Ok(Json(DeleteResponse { ok: true }))
}

/// Exports the caller's URLs as `Generated_URLs.xlsx`
///
/// # Response
///
/// - **200 OK** - spreadsheet attachment
/// - **404 Not Found** - `{"error": "No Generated URL found"}` for users
///   without a collection
pub async fn export_urls(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, AppError> {
    let collection = state
        .store
        .find_collection(&user_id)?
        .ok_or(AppError::NotFound("No Generated URL found"))?;

    let rows = export_rows(&collection.url_array, &state.settings.short_url_prefix);
    let workbook = render_workbook(&rows, &state.settings.export_author, Utc::now())?;
    tracing::debug!(user_id = %user_id, rows = rows.len(), "urls exported");

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, XLSX_CONTENT_DISPOSITION),
        ],
        workbook,
    )
        .into_response())
}
