use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::routes::AppState;
use crate::services::auth::{self, LoginInput, SignupInput};
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> Result<Response, AppError> {
    let session = auth::signup(state.store.as_ref(), &state.config, input).await?;
    Ok(created(session, "Account created"))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Response, AppError> {
    let session = auth::login(state.store.as_ref(), &state.config, input).await?;
    Ok(success(session, "Logged in"))
}

#[derive(Deserialize)]
pub struct RefreshInput {
    #[serde(default)]
    pub refresh_token: String,
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> Result<Response, AppError> {
    let session =
        auth::refresh(state.store.as_ref(), &state.config, &input.refresh_token).await?;
    Ok(success(session, "Token refreshed"))
}

pub async fn logout() -> Response {
    // Tokens are stateless; the client just drops them.
    empty_success("Logged out")
}
