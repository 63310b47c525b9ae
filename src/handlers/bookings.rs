use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthUser;
use crate::models::user::Role;
use crate::routes::AppState;
use crate::services::bookings::{self, BookingListQuery, CreateBookingInput};
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn create_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateBookingInput>,
) -> Result<Response, AppError> {
    auth.require_role(Role::Guest)?;
    let booking =
        bookings::create_booking_request(state.store.as_ref(), auth.id, input).await?;
    Ok(created(
        booking,
        "Booking request submitted (pending approval).",
    ))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> Result<Response, AppError> {
    auth.require_role(Role::Guest)?;
    let (metadata, bookings) =
        bookings::my_bookings(state.store.as_ref(), auth.id, query).await?;
    Ok(success(
        json!({ "metadata": metadata, "bookings": bookings }),
        "Bookings fetched",
    ))
}

pub async fn owner_booking_list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> Result<Response, AppError> {
    auth.require_role(Role::Owner)?;
    let (metadata, bookings) =
        bookings::owner_booking_requests(state.store.as_ref(), auth.id, query).await?;
    Ok(success(
        json!({ "metadata": metadata, "bookings": bookings }),
        "Booking requests fetched",
    ))
}

#[derive(Deserialize)]
pub struct DecisionInput {
    pub decision: String,
    pub reason: Option<String>,
}

pub async fn decide_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(booking_id): Path<String>,
    Json(input): Json<DecisionInput>,
) -> Result<Response, AppError> {
    auth.require_role(Role::Owner)?;
    let booking = bookings::decide_booking(
        state.store.as_ref(),
        auth.id,
        &booking_id,
        &input.decision,
        input.reason,
    )
    .await?;
    let message = format!("Booking {}.", booking.status.as_str());
    Ok(success(booking, message))
}
