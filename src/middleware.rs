use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::database::AppState;

/// Header carrying the identity forwarded by the authentication gateway
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Identity of the caller, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Unauthorized",
            "message": message
        })),
    )
        .into_response()
}

/// Middleware guarding the per-user routes
///
/// Login and sessions live in front of this service; the gateway forwards
/// the authenticated user in `X-User-Id`. If an API secret is configured,
/// the `Authorization` header must also match it (a `Bearer ` prefix is
/// accepted).
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    if let Some(secret) = &state.settings.api_secret {
        let provided = headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value));

        if provided != Some(secret.as_str()) {
            return Err(unauthorized("Invalid or missing authorization header"));
        }
    }

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| unauthorized("Missing user identity"))?;

    request.extensions_mut().insert(AuthUser(user_id.to_string()));
    Ok(next.run(request).await)
}
