//! Availability & pricing evaluation for booking requests.
//!
//! Pure functions over already-loaded inventory records. The quote is
//! computed exclusively from the hotel and room-type documents; nothing
//! the client sent about price or currency is ever consulted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::hotel::Hotel;
use crate::models::room_type::RoomType;
use crate::utils::error::AppError;

/// Whole nights between two dates. `NaiveDate` carries no time of day, so
/// this is exactly the calendar-day difference.
pub fn calc_nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

/// Server-side price snapshot for one booking request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub nights: i64,
    pub price_per_night: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
}

/// Validates a request against the room type's declared capacity and
/// quantity and prices it. The quantity check is against the declared
/// total only; rooms committed to overlapping date ranges by other
/// bookings are not subtracted.
pub fn evaluate(
    hotel: &Hotel,
    room_type: &RoomType,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests_adults: i32,
    rooms_requested: i32,
) -> Result<Quote, AppError> {
    let nights = calc_nights(check_in, check_out);
    if nights <= 0 {
        return Err(AppError::InvalidDateRange(
            "Invalid dates (check-out must be after check-in)".into(),
        ));
    }

    if guests_adults < 1 {
        return Err(AppError::InvalidGuestCount(
            "guests_adults must be >= 1".into(),
        ));
    }
    if rooms_requested < 1 {
        return Err(AppError::InvalidGuestCount(
            "rooms_requested must be >= 1".into(),
        ));
    }

    // Guest selects one room type; the request must cover everyone.
    let capacity = room_type.capacity_adults;
    let required_rooms_min = (guests_adults + capacity - 1) / capacity;
    if rooms_requested < required_rooms_min {
        return Err(AppError::InsufficientRoomsForGuests(format!(
            "This room type fits {capacity} adults. You need at least \
             {required_rooms_min} room(s) for {guests_adults} adults."
        )));
    }

    if rooms_requested > room_type.quantity {
        return Err(AppError::InsufficientInventory(format!(
            "Only {} rooms available for this room type.",
            room_type.quantity
        )));
    }

    let price_per_night = room_type.price_per_night;
    let total_amount =
        price_per_night * Decimal::from(nights) * Decimal::from(rooms_requested);

    Ok(Quote {
        nights,
        price_per_night,
        total_amount,
        currency: hotel.currency.clone(),
    })
}
