use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse, UserResponse},
        extractors::AuthUser,
    },
    error::AuthError,
    response::ApiResponse,
    state::AppState,
};

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AuthError>;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user/me", get(get_me))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| AuthError::validation(rejection.body_text()))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let req = body(payload)?.validate()?;
    let user = state
        .auth
        .register(req.name, req.email, req.password)
        .await?;
    Ok(ApiResponse::data(StatusCode::CREATED, user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let req = body(payload)?.validate()?;
    let token = state.auth.login(&req.email, req.password).await?;
    Ok(ApiResponse::data(StatusCode::OK, TokenResponse { token }))
}

#[instrument(skip(state, identity), fields(user_id = %identity.0.user_id, email = %identity.0.email))]
pub async fn get_me(
    State(state): State<AppState>,
    identity: AuthUser,
) -> ApiResult<UserResponse> {
    let AuthUser(identity) = identity;
    let user = state.auth.get_profile(identity.user_id).await?;
    Ok(ApiResponse::data(StatusCode::OK, user))
}
