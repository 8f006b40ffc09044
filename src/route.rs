//! Route definitions for the URL shortener API
//!
//! This module maps HTTP routes to their handlers and attaches the
//! authentication middleware to the per-user routes.

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::database::AppState;
use crate::handler::{create_short_url, delete_short_url, export_urls, list_history, redirect_url};
use crate::middleware::auth_middleware;

/// Creates the application router
///
/// # Route Definitions
///
/// - `GET /url/{short}` - Redirects to the original URL (public)
/// - `GET /history` - Lists the caller's URLs
/// - `POST /url` - Creates a short URL
/// - `DELETE /delete/{id}` - Deletes one of the caller's URLs
/// - `GET /export` - Downloads the caller's URLs as a spreadsheet
///
/// # Example Usage
///
/// ```no_run
/// # use urlvault::config::Settings;
/// # use urlvault::database::{init_db, AppState};
/// # use urlvault::route::create_app;
/// # let db = init_db("data.db").unwrap();
/// let state = AppState::new(db, Settings::with_prefix("http://localhost:8080/url/"));
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    // Routes that need an authenticated user
    let user_routes = Router::new()
        .route("/history", get(list_history))
        .route("/url", post(create_short_url))
        .route("/delete/{id}", delete(delete_short_url))
        .route("/export", get(export_urls))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/url/{short}", get(redirect_url))
        .merge(user_routes)
        .with_state(state)
}
