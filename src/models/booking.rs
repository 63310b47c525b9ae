use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "rejected" => Some(BookingStatus::Rejected),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// Contact details collected when the guest confirms the request.
/// `full_name` and `phone` are required; the rest default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub arrival_time: String,
    pub notes: String,
}

/// Stamped exactly once, when the owner approves or rejects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerDecision {
    pub decided_at: DateTime<Utc>,
    pub decided_by: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub room_type_id: Uuid,
    pub guest_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests_adults: i32,
    pub rooms_requested: i32,
    pub currency: String,
    /// Snapshot of the room type's price at booking time. Immutable.
    pub price_per_night: Decimal,
    /// Snapshot: price_per_night * nights * rooms_requested.
    pub total_amount: Decimal,
    pub guest_info: GuestInfo,
    pub status: BookingStatus,
    pub owner_decision: Option<OwnerDecision>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row: a booking plus lightweight references to the documents it
/// points at, so clients don't need follow-up lookups.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub hotel: Option<HotelRef>,
    pub room_type: Option<RoomTypeRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<GuestRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HotelRef {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomTypeRef {
    pub id: Uuid,
    pub title: String,
    pub capacity_adults: i32,
    pub price_per_night: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuestRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Approved,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("confirmed"), None);
    }
}
