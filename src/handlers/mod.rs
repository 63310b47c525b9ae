use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::routes::AppState;
use crate::utils::response::success;

pub mod auth;
pub mod bookings;
pub mod hotels;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    store: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> Response {
    let status = match state.store.health_check().await {
        Ok(()) => "ok",
        Err(_) => "degraded",
    };
    let payload = HealthPayload {
        status,
        service: "roomora-api",
        store: state.store.backend_name(),
    };

    success(payload, "Health check successful")
}
