use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoomType {
    pub id: Uuid,
    pub hotel_id: Uuid,
    /// e.g. "Standard Double"
    pub title: String,
    pub capacity_adults: i32,
    /// How many rooms of this type the hotel has.
    pub quantity: i32,
    pub price_per_night: Decimal,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
