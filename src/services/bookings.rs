//! Booking workflows: guest admission, the owner's one-shot decision, and
//! the guest/owner listing views.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::booking::{
    Booking, BookingStatus, BookingView, GuestInfo, GuestRef, HotelRef, OwnerDecision,
    RoomTypeRef,
};
use crate::services::availability;
use crate::store::{BookingFilter, Store, StoreError};
use crate::utils::error::AppError;
use crate::utils::pagination::{paginate, PageMetadata, PageParams};

#[derive(Debug, Clone, Deserialize)]
pub struct GuestInfoInput {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub arrival_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingInput {
    pub hotel_id: String,
    pub room_type_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests_adults: i32,
    pub rooms_requested: i32,
    pub guest_info: GuestInfoInput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Optional status filter; unknown values are ignored.
    pub status: Option<String>,
}

impl BookingListQuery {
    fn params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

fn trimmed_or_empty(value: Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or("").to_string()
}

/// Admits a booking request into `pending` state. Price and currency are
/// snapshotted from the inventory records at this moment and never change
/// afterwards; no inventory is decremented.
pub async fn create_booking_request(
    store: &dyn Store,
    guest_id: Uuid,
    input: CreateBookingInput,
) -> Result<Booking, AppError> {
    let (Ok(hotel_id), Ok(room_type_id)) = (
        Uuid::parse_str(&input.hotel_id),
        Uuid::parse_str(&input.room_type_id),
    ) else {
        return Err(AppError::InvalidIdentifier(
            "Invalid hotel_id or room_type_id".into(),
        ));
    };

    let hotel = store
        .find_hotel(hotel_id)
        .await?
        .ok_or(AppError::HotelNotFound)?;

    // Scoped lookup: a room type of some other hotel must not resolve.
    let room_type = store
        .find_room_type_in_hotel(hotel_id, room_type_id)
        .await?
        .ok_or(AppError::RoomTypeNotFound)?;

    let full_name = input.guest_info.full_name.trim().to_string();
    let phone = input.guest_info.phone.trim().to_string();
    if full_name.is_empty() || phone.is_empty() {
        return Err(AppError::InvalidGuestInfo(
            "Guest full_name and phone are required".into(),
        ));
    }

    let quote = availability::evaluate(
        &hotel,
        &room_type,
        input.check_in,
        input.check_out,
        input.guests_adults,
        input.rooms_requested,
    )?;

    let now = Utc::now();
    let booking = Booking {
        id: Uuid::new_v4(),
        hotel_id,
        room_type_id,
        guest_id,
        check_in: input.check_in,
        check_out: input.check_out,
        guests_adults: input.guests_adults,
        rooms_requested: input.rooms_requested,
        currency: quote.currency,
        price_per_night: quote.price_per_night,
        total_amount: quote.total_amount,
        guest_info: GuestInfo {
            full_name,
            phone,
            email: trimmed_or_empty(input.guest_info.email),
            arrival_time: trimmed_or_empty(input.guest_info.arrival_time),
            notes: trimmed_or_empty(input.guest_info.notes),
        },
        status: BookingStatus::Pending,
        owner_decision: None,
        created_at: now,
        updated_at: now,
    };

    let booking = store.insert_booking(booking).await?;
    tracing::info!(
        booking_id = %booking.id,
        hotel_id = %hotel_id,
        nights = quote.nights,
        "booking request admitted"
    );
    Ok(booking)
}

/// Approves or rejects a pending booking, exactly once, by the owner of
/// the referenced hotel. The pending check and the status write happen in
/// one atomic store operation; a raced second call fails with
/// `InvalidBookingState` instead of overwriting the first decision.
pub async fn decide_booking(
    store: &dyn Store,
    owner_id: Uuid,
    booking_id: &str,
    decision: &str,
    reason: Option<String>,
) -> Result<Booking, AppError> {
    let booking_id = Uuid::parse_str(booking_id)
        .map_err(|_| AppError::InvalidIdentifier("Invalid booking id".into()))?;

    let status = match decision {
        "approved" => BookingStatus::Approved,
        "rejected" => BookingStatus::Rejected,
        _ => return Err(AppError::InvalidDecision),
    };

    let booking = store
        .find_booking(booking_id)
        .await?
        .ok_or(AppError::BookingNotFound)?;

    let hotel = store
        .find_hotel(booking.hotel_id)
        .await?
        .ok_or(AppError::HotelNotFound)?;
    if hotel.owner_id != owner_id {
        return Err(AppError::Forbidden("not your hotel".into()));
    }

    if booking.status != BookingStatus::Pending {
        return Err(AppError::InvalidBookingState);
    }

    let decision = OwnerDecision {
        decided_at: Utc::now(),
        decided_by: owner_id,
        reason: trimmed_or_empty(reason),
    };

    match store.decide_booking(booking_id, status, decision).await {
        // CAS miss: someone else decided between our read and the write.
        Ok(None) => Err(AppError::InvalidBookingState),
        Ok(Some(updated)) => {
            tracing::info!(
                booking_id = %booking_id,
                status = status.as_str(),
                "booking decided"
            );
            Ok(updated)
        }
        Err(StoreError::NotFound(_)) => Err(AppError::BookingNotFound),
        Err(err) => Err(err.into()),
    }
}

/// Guest's own booking history, newest first.
pub async fn my_bookings(
    store: &dyn Store,
    guest_id: Uuid,
    query: BookingListQuery,
) -> Result<(PageMetadata, Vec<BookingView>), AppError> {
    let filter = BookingFilter {
        guest_id: Some(guest_id),
        hotel_ids: None,
        status: query.status.as_deref().and_then(BookingStatus::parse),
    };
    let params = query.params();
    let (page, limit) = (params.page(), params.limit());
    let (bookings, total) = store.list_bookings(&filter, params.offset(), limit).await?;
    let views = build_views(store, bookings, false).await?;
    Ok((paginate(total, page, limit), views))
}

/// Booking requests across all hotels of one owner, newest first. Owners
/// without hotels get an empty page rather than an error.
pub async fn owner_booking_requests(
    store: &dyn Store,
    owner_id: Uuid,
    query: BookingListQuery,
) -> Result<(PageMetadata, Vec<BookingView>), AppError> {
    let params = query.params();
    let (page, limit) = (params.page(), params.limit());

    let hotel_ids = store.list_owner_hotel_ids(owner_id).await?;
    if hotel_ids.is_empty() {
        return Ok((paginate(0, page, limit), Vec::new()));
    }

    let filter = BookingFilter {
        guest_id: None,
        hotel_ids: Some(hotel_ids),
        status: query.status.as_deref().and_then(BookingStatus::parse),
    };
    let (bookings, total) = store.list_bookings(&filter, params.offset(), limit).await?;
    let views = build_views(store, bookings, true).await?;
    Ok((paginate(total, page, limit), views))
}

/// Attaches hotel/room-type (and optionally guest) reference summaries to
/// a page of bookings, fetching each referenced document once.
async fn build_views(
    store: &dyn Store,
    bookings: Vec<Booking>,
    include_guest: bool,
) -> Result<Vec<BookingView>, AppError> {
    let mut hotels: HashMap<Uuid, HotelRef> = HashMap::new();
    let mut room_types: HashMap<Uuid, RoomTypeRef> = HashMap::new();
    let mut guests: HashMap<Uuid, GuestRef> = HashMap::new();

    let mut views = Vec::with_capacity(bookings.len());
    for booking in bookings {
        if !hotels.contains_key(&booking.hotel_id) {
            if let Some(hotel) = store.find_hotel(booking.hotel_id).await? {
                hotels.insert(
                    hotel.id,
                    HotelRef {
                        id: hotel.id,
                        name: hotel.name,
                        city: hotel.city,
                        country: hotel.country,
                    },
                );
            }
        }
        if !room_types.contains_key(&booking.room_type_id) {
            if let Some(rt) = store
                .find_room_type_in_hotel(booking.hotel_id, booking.room_type_id)
                .await?
            {
                room_types.insert(
                    rt.id,
                    RoomTypeRef {
                        id: rt.id,
                        title: rt.title,
                        capacity_adults: rt.capacity_adults,
                        price_per_night: rt.price_per_night,
                    },
                );
            }
        }
        if include_guest && !guests.contains_key(&booking.guest_id) {
            if let Some(user) = store.find_user(booking.guest_id).await? {
                guests.insert(
                    user.id,
                    GuestRef {
                        id: user.id,
                        name: format!("{} {}", user.first_name, user.last_name),
                        email: user.email,
                    },
                );
            }
        }

        let hotel = hotels.get(&booking.hotel_id).cloned();
        let room_type = room_types.get(&booking.room_type_id).cloned();
        let guest = if include_guest {
            guests.get(&booking.guest_id).cloned()
        } else {
            None
        };
        views.push(BookingView {
            booking,
            hotel,
            room_type,
            guest,
        });
    }
    Ok(views)
}
