use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, AuthResponse, LoginRequest, RegisterRequest};
use crate::models::user::{NewUser, User};
use crate::services::{AuthSession, Claims};

// ============================================================================
// Middleware
// ============================================================================

/// Requires `Authorization: Bearer <token>` and makes the decoded [`Claims`]
/// available to handlers as an extension.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state.auth().verify_token(&token)?;
    tracing::Span::current().record("user_id", claims.sub.as_str());

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

fn auth_response(session: AuthSession) -> Json<ApiResponse<AuthResponse>> {
    Json(ApiResponse::success(AuthResponse {
        token: session.token,
        user: session.user,
    }))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let session = state
        .auth()
        .register(NewUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            role: payload.role,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(auth_response(session))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let session = state.auth().login(&payload.email, &payload.password).await?;
    Ok(auth_response(session))
}

/// GET /api/auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.auth().current_user(&claims).await?;
    Ok(Json(ApiResponse::success(user)))
}
