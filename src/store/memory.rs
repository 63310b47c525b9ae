//! In-memory implementation of [`Store`].
//!
//! Backs tests and dependency-free development runs. All documents live in
//! `HashMap`s behind a single `tokio::sync::RwLock`; every mutating method
//! takes the write lock for its whole scope, so the multi-document
//! operations are atomic the same way the Postgres transactions are. Not
//! durable: state is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookingFilter, HotelFilter, HotelSyncPlan, Store, StoreError, StoreResult};
use crate::models::booking::{Booking, BookingStatus, OwnerDecision};
use crate::models::hotel::{Hotel, OwnerHotelSummary};
use crate::models::room_type::RoomType;
use crate::models::user::User;

#[derive(Default)]
struct StoreState {
    users: HashMap<Uuid, User>,
    hotels: HashMap<Uuid, Hotel>,
    room_types: HashMap<Uuid, RoomType>,
    bookings: HashMap<Uuid, Booking>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn hotel_matches(hotel: &Hotel, filter: &HotelFilter) -> bool {
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let hit = hotel.name.to_lowercase().contains(&needle)
            || hotel.city.to_lowercase().contains(&needle)
            || hotel.country.to_lowercase().contains(&needle);
        if !hit {
            return false;
        }
    }
    if !filter.amenities.is_empty()
        && !filter.amenities.iter().all(|a| hotel.amenities.contains(a))
    {
        return false;
    }
    if let Some(cap) = filter.price_up_to {
        if hotel.starting_price_per_night > cap {
            return false;
        }
    }
    true
}

fn booking_matches(booking: &Booking, filter: &BookingFilter) -> bool {
    if let Some(guest_id) = filter.guest_id {
        if booking.guest_id != guest_id {
            return false;
        }
    }
    if let Some(hotel_ids) = &filter.hotel_ids {
        if !hotel_ids.contains(&booking.hotel_id) {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if booking.status != status {
            return false;
        }
    }
    true
}

fn page<T: Clone>(items: &[T], offset: i64, limit: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Duplicate("Email".into()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_hotel(&self, id: Uuid) -> StoreResult<Option<Hotel>> {
        Ok(self.state.read().await.hotels.get(&id).cloned())
    }

    async fn list_hotels(
        &self,
        filter: &HotelFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Hotel>, i64)> {
        let state = self.state.read().await;
        let mut hotels: Vec<Hotel> = state
            .hotels
            .values()
            .filter(|h| hotel_matches(h, filter))
            .cloned()
            .collect();

        if filter.sort_by_rating {
            hotels.sort_by(|a, b| {
                b.rating
                    .partial_cmp(&a.rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.created_at.cmp(&a.created_at))
            });
        } else {
            hotels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }

        let total = hotels.len() as i64;
        Ok((page(&hotels, offset, limit), total))
    }

    async fn list_owner_hotels(&self, owner_id: Uuid) -> StoreResult<Vec<OwnerHotelSummary>> {
        let state = self.state.read().await;
        let mut hotels: Vec<Hotel> = state
            .hotels
            .values()
            .filter(|h| h.owner_id == owner_id)
            .cloned()
            .collect();
        hotels.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let summaries = hotels
            .into_iter()
            .map(|hotel| {
                let total_bookings_count = state
                    .bookings
                    .values()
                    .filter(|b| b.hotel_id == hotel.id)
                    .count() as i64;
                let active_requests_count = state
                    .bookings
                    .values()
                    .filter(|b| b.hotel_id == hotel.id && b.status == BookingStatus::Pending)
                    .count() as i64;
                let total_rooms_count = state
                    .room_types
                    .values()
                    .filter(|rt| rt.hotel_id == hotel.id)
                    .map(|rt| rt.quantity as i64)
                    .sum();
                OwnerHotelSummary {
                    hotel,
                    total_bookings_count,
                    active_requests_count,
                    total_rooms_count,
                }
            })
            .collect();
        Ok(summaries)
    }

    async fn list_owner_hotel_ids(&self, owner_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .state
            .read()
            .await
            .hotels
            .values()
            .filter(|h| h.owner_id == owner_id)
            .map(|h| h.id)
            .collect())
    }

    async fn list_room_types(&self, hotel_id: Uuid) -> StoreResult<Vec<RoomType>> {
        let state = self.state.read().await;
        let mut room_types: Vec<RoomType> = state
            .room_types
            .values()
            .filter(|rt| rt.hotel_id == hotel_id)
            .cloned()
            .collect();
        room_types.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(room_types)
    }

    async fn find_room_type_in_hotel(
        &self,
        hotel_id: Uuid,
        room_type_id: Uuid,
    ) -> StoreResult<Option<RoomType>> {
        Ok(self
            .state
            .read()
            .await
            .room_types
            .get(&room_type_id)
            .filter(|rt| rt.hotel_id == hotel_id)
            .cloned())
    }

    async fn insert_booking(&self, booking: Booking) -> StoreResult<Booking> {
        let mut state = self.state.write().await;
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Booking>, i64)> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| booking_matches(b, filter))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = bookings.len() as i64;
        Ok((page(&bookings, offset, limit), total))
    }

    async fn create_hotel_with_room_types(
        &self,
        hotel: Hotel,
        room_types: Vec<RoomType>,
    ) -> StoreResult<Hotel> {
        let mut state = self.state.write().await;
        state.hotels.insert(hotel.id, hotel.clone());
        for rt in room_types {
            state.room_types.insert(rt.id, rt);
        }
        Ok(hotel)
    }

    async fn apply_hotel_sync(&self, plan: HotelSyncPlan) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.hotels.contains_key(&plan.hotel.id) {
            return Err(StoreError::NotFound(format!("hotel {}", plan.hotel.id)));
        }

        for id in &plan.delete {
            state.room_types.remove(id);
        }
        for rt in plan.update.into_iter().chain(plan.create) {
            state.room_types.insert(rt.id, rt);
        }
        state.hotels.insert(plan.hotel.id, plan.hotel);
        Ok(())
    }

    async fn decide_booking(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        decision: OwnerDecision,
    ) -> StoreResult<Option<Booking>> {
        let mut state = self.state.write().await;
        let Some(booking) = state.bookings.get_mut(&booking_id) else {
            return Err(StoreError::NotFound(format!("booking {booking_id}")));
        };
        if booking.status != BookingStatus::Pending {
            return Ok(None);
        }
        booking.status = status;
        booking.owner_decision = Some(decision);
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
