use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Hotel {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub city: String,
    pub country: String,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub amenities: Vec<String>,
    pub rating: Option<f32>,
    pub currency: String,
    /// Derived: min price_per_night over the hotel's room types. Written
    /// only at the end of the creation/sync transactions, never patched.
    pub starting_price_per_night: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner dashboard row: a hotel plus booking/room counts.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerHotelSummary {
    #[serde(flatten)]
    pub hotel: Hotel,
    pub total_bookings_count: i64,
    pub active_requests_count: i64,
    pub total_rooms_count: i64,
}
