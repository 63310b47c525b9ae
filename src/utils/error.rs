use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;
use crate::utils::response::error as error_response;

/// Every failure the workflows can surface, typed by kind. Handlers never
/// build error responses themselves; they bubble one of these up.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidIdentifier(String),

    #[error("{0}")]
    InvalidDateRange(String),

    #[error("{0}")]
    InvalidGuestCount(String),

    #[error("{0}")]
    InsufficientRoomsForGuests(String),

    #[error("{0}")]
    InsufficientInventory(String),

    #[error("{0}")]
    InvalidGuestInfo(String),

    #[error("Hotel not found")]
    HotelNotFound,

    #[error("Room type not found for this hotel")]
    RoomTypeNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Only pending bookings can be decided")]
    InvalidBookingState,

    #[error("decision must be approved or rejected")]
    InvalidDecision,

    #[error("{0}")]
    MissingRequiredField(String),

    #[error("At least one room type is required")]
    NoRoomTypesProvided,

    #[error("Hotel must have at least one room type")]
    NoRoomTypesRemaining,

    #[error("{0}")]
    InvalidRoomTypeId(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    DuplicateKey(String),

    #[error("{0}")]
    AuthError(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Database error")]
    DatabaseError(#[source] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidIdentifier(_)
            | AppError::InvalidDateRange(_)
            | AppError::InvalidGuestCount(_)
            | AppError::InsufficientRoomsForGuests(_)
            | AppError::InsufficientInventory(_)
            | AppError::InvalidGuestInfo(_)
            | AppError::InvalidBookingState
            | AppError::InvalidDecision
            | AppError::MissingRequiredField(_)
            | AppError::NoRoomTypesProvided
            | AppError::NoRoomTypesRemaining
            | AppError::InvalidRoomTypeId(_)
            | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::HotelNotFound
            | AppError::RoomTypeNotFound
            | AppError::BookingNotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::AuthError(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            AppError::InvalidDateRange(_) => "INVALID_DATE_RANGE",
            AppError::InvalidGuestCount(_) => "INVALID_GUEST_COUNT",
            AppError::InsufficientRoomsForGuests(_) => "INSUFFICIENT_ROOMS_FOR_GUESTS",
            AppError::InsufficientInventory(_) => "INSUFFICIENT_INVENTORY",
            AppError::InvalidGuestInfo(_) => "INVALID_GUEST_INFO",
            AppError::HotelNotFound => "HOTEL_NOT_FOUND",
            AppError::RoomTypeNotFound => "ROOM_TYPE_NOT_FOUND",
            AppError::BookingNotFound => "BOOKING_NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidBookingState => "INVALID_BOOKING_STATE",
            AppError::InvalidDecision => "INVALID_DECISION",
            AppError::MissingRequiredField(_) => "MISSING_REQUIRED_FIELD",
            AppError::NoRoomTypesProvided => "NO_ROOM_TYPES_PROVIDED",
            AppError::NoRoomTypesRemaining => "NO_ROOM_TYPES_REMAINING",
            AppError::InvalidRoomTypeId(_) => "INVALID_ROOM_TYPE_ID",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DuplicateKey(_) => "DUPLICATE_KEY",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }
}

/// Store failures that reach a service without an explicit mapping.
/// Uniqueness violations become `DuplicateKey`; the rest are internal.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => {
                AppError::DuplicateKey(format!("{field} already exists"))
            }
            StoreError::NotFound(what) => {
                AppError::DatabaseError(anyhow::anyhow!("unexpected missing record: {what}"))
            }
            StoreError::Conflict(msg) => {
                AppError::DatabaseError(anyhow::anyhow!("unexpected conflict: {msg}"))
            }
            StoreError::Unexpected(e) => AppError::DatabaseError(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Internal details are logged, not returned.
        let public_message = match &self {
            AppError::DatabaseError(e) => {
                error!(error = ?e, "database error");
                "A database error occurred".to_string()
            }
            other => other.to_string(),
        };

        error_response(code, public_message, None, status)
    }
}
