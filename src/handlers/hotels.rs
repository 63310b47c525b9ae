use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthUser;
use crate::models::user::Role;
use crate::routes::AppState;
use crate::services::hotels::{
    self, CreateHotelInput, HotelListQuery, HotelPatch, RoomTypeInput,
};
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn add_hotel(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateHotelInput>,
) -> Result<Response, AppError> {
    auth.require_role(Role::Owner)?;
    let hotel = hotels::create_hotel(state.store.as_ref(), auth.id, input).await?;
    Ok(created(hotel, "Hotel created"))
}

#[derive(Deserialize)]
pub struct EditHotelBody {
    pub hotel: HotelPatch,
    pub room_types: Vec<RoomTypeInput>,
}

pub async fn edit_hotel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(hotel_id): Path<String>,
    Json(body): Json<EditHotelBody>,
) -> Result<Response, AppError> {
    auth.require_role(Role::Owner)?;
    hotels::sync_hotel(
        state.store.as_ref(),
        auth.id,
        &hotel_id,
        body.hotel,
        body.room_types,
    )
    .await?;
    Ok(empty_success("Hotel and room types updated successfully"))
}

pub async fn get_hotels(
    State(state): State<AppState>,
    Query(query): Query<HotelListQuery>,
) -> Result<Response, AppError> {
    let (metadata, hotels) = hotels::list_hotels(state.store.as_ref(), query).await?;
    Ok(success(
        json!({ "metadata": metadata, "hotels": hotels }),
        "Hotels fetched",
    ))
}

pub async fn hotel_details(
    State(state): State<AppState>,
    Path(hotel_id): Path<String>,
) -> Result<Response, AppError> {
    let (hotel, room_types) = hotels::hotel_details(state.store.as_ref(), &hotel_id).await?;
    Ok(success(
        json!({ "hotel": hotel, "room_types": room_types }),
        "Hotel details fetched",
    ))
}

pub async fn owner_hotels(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Response, AppError> {
    auth.require_role(Role::Owner)?;
    let hotels = hotels::owner_hotels(state.store.as_ref(), auth.id).await?;
    Ok(success(
        json!({ "count": hotels.len(), "hotels": hotels }),
        "Owner hotels fetched",
    ))
}
