use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, OwnerDecision};
use crate::models::hotel::{Hotel, OwnerHotelSummary};
use crate::models::room_type::RoomType;
use crate::models::user::User;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate: {0}")]
    Duplicate(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Public hotel listing filters. All optional; combined with AND.
#[derive(Debug, Clone, Default)]
pub struct HotelFilter {
    /// Case-insensitive match against name, city or country.
    pub search: Option<String>,
    /// Every listed amenity must be present on the hotel.
    pub amenities: Vec<String>,
    /// Upper bound on starting_price_per_night.
    pub price_up_to: Option<Decimal>,
    /// Sort by rating (desc) instead of newest-first.
    pub sort_by_rating: bool,
}

/// Booking listing filters; exactly one of `guest_id` / `hotel_ids` is set
/// by the calling workflow.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub guest_id: Option<Uuid>,
    pub hotel_ids: Option<Vec<Uuid>>,
    pub status: Option<BookingStatus>,
}

/// Fully validated target state for one hotel sync. The three room-type
/// lists are disjoint; `hotel` already carries the recomputed starting
/// price. Stores apply the whole plan atomically or not at all.
#[derive(Debug, Clone)]
pub struct HotelSyncPlan {
    pub hotel: Hotel,
    pub update: Vec<RoomType>,
    pub create: Vec<RoomType>,
    pub delete: Vec<Uuid>,
}

/// Persistence boundary for the whole service. Documents are constructed
/// and validated by the workflows; implementations only move them in and
/// out of storage. Multi-document operations are single methods so each
/// backend can supply its native all-or-nothing guarantee.
#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    // hotels
    async fn find_hotel(&self, id: Uuid) -> StoreResult<Option<Hotel>>;
    async fn list_hotels(
        &self,
        filter: &HotelFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Hotel>, i64)>;
    async fn list_owner_hotels(&self, owner_id: Uuid) -> StoreResult<Vec<OwnerHotelSummary>>;
    async fn list_owner_hotel_ids(&self, owner_id: Uuid) -> StoreResult<Vec<Uuid>>;

    // room types
    async fn list_room_types(&self, hotel_id: Uuid) -> StoreResult<Vec<RoomType>>;
    async fn find_room_type_in_hotel(
        &self,
        hotel_id: Uuid,
        room_type_id: Uuid,
    ) -> StoreResult<Option<RoomType>>;

    // bookings
    async fn insert_booking(&self, booking: Booking) -> StoreResult<Booking>;
    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;
    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Booking>, i64)>;

    // atomic multi-document operations
    async fn create_hotel_with_room_types(
        &self,
        hotel: Hotel,
        room_types: Vec<RoomType>,
    ) -> StoreResult<Hotel>;
    async fn apply_hotel_sync(&self, plan: HotelSyncPlan) -> StoreResult<()>;

    /// Compare-and-set: moves a booking out of `pending` and stamps the
    /// owner decision in one atomic read-modify-write. Returns `Ok(None)`
    /// when the booking exists but is no longer pending (a concurrent
    /// caller won the race); the write is then skipped entirely.
    async fn decide_booking(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        decision: OwnerDecision,
    ) -> StoreResult<Option<Booking>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
