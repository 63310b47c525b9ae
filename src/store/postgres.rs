//! Postgres-backed implementation of [`Store`].
//!
//! Documents live in four authoritative tables (`users`, `hotels`,
//! `room_types`, `bookings`); the schema is created by the migrations in
//! `migrations/`, run at startup. Multi-document operations run inside one
//! sqlx transaction: everything commits or the transaction drops and rolls
//! back — there is no compensating-write path. The decision CAS is a single
//! guarded UPDATE so the pending check and the write cannot be split.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{BookingFilter, HotelFilter, HotelSyncPlan, Store, StoreError, StoreResult};
use crate::models::booking::{Booking, BookingStatus, GuestInfo, OwnerDecision};
use crate::models::hotel::{Hotel, OwnerHotelSummary};
use crate::models::room_type::RoomType;
use crate::models::user::{Role, User};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique-constraint violations become `Duplicate`; anything else is
/// surfaced as an unexpected store failure.
fn map_sqlx_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            return StoreError::Duplicate(
                db.constraint().unwrap_or("unique field").to_string(),
            );
        }
    }
    StoreError::Unexpected(err.into())
}

/// DB-facing row for `users`; the TEXT `role` column is parsed on the way
/// out so the domain type carries the enum.
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| {
            StoreError::Unexpected(anyhow::anyhow!("unknown role '{}'", row.role))
        })?;
        Ok(User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// DB-facing row for `bookings`. Kept separate from the domain type so the
/// nested `guest_info` / `owner_decision` objects can live in flat columns.
#[derive(Debug, FromRow)]
struct BookingRow {
    id: Uuid,
    hotel_id: Uuid,
    room_type_id: Uuid,
    guest_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests_adults: i32,
    rooms_requested: i32,
    currency: String,
    price_per_night: Decimal,
    total_amount: Decimal,
    guest_full_name: String,
    guest_phone: String,
    guest_email: String,
    guest_arrival_time: String,
    guest_notes: String,
    status: String,
    decided_at: Option<DateTime<Utc>>,
    decided_by: Option<Uuid>,
    decision_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Unexpected(anyhow::anyhow!("unknown booking status '{}'", row.status))
        })?;
        let owner_decision = match (row.decided_at, row.decided_by) {
            (Some(decided_at), Some(decided_by)) => Some(OwnerDecision {
                decided_at,
                decided_by,
                reason: row.decision_reason.unwrap_or_default(),
            }),
            _ => None,
        };
        Ok(Booking {
            id: row.id,
            hotel_id: row.hotel_id,
            room_type_id: row.room_type_id,
            guest_id: row.guest_id,
            check_in: row.check_in,
            check_out: row.check_out,
            guests_adults: row.guests_adults,
            rooms_requested: row.rooms_requested,
            currency: row.currency,
            price_per_night: row.price_per_night,
            total_amount: row.total_amount,
            guest_info: GuestInfo {
                full_name: row.guest_full_name,
                phone: row.guest_phone,
                email: row.guest_email,
                arrival_time: row.guest_arrival_time,
                notes: row.guest_notes,
            },
            status,
            owner_decision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OwnerHotelRow {
    #[sqlx(flatten)]
    hotel: Hotel,
    total_bookings_count: i64,
    active_requests_count: i64,
    total_rooms_count: i64,
}

const HOTEL_COLUMNS: &str = "id, owner_id, name, city, country, images, description, amenities, \
     rating, currency, starting_price_per_night, created_at, updated_at";

fn push_hotel_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &HotelFilter) {
    builder.push(" WHERE TRUE");
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR city ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR country ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if !filter.amenities.is_empty() {
        builder
            .push(" AND amenities @> ")
            .push_bind(filter.amenities.clone());
    }
    if let Some(cap) = filter.price_up_to {
        builder
            .push(" AND starting_price_per_night <= ")
            .push_bind(cap);
    }
}

fn push_booking_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
    builder.push(" WHERE TRUE");
    if let Some(guest_id) = filter.guest_id {
        builder.push(" AND guest_id = ").push_bind(guest_id);
    }
    if let Some(hotel_ids) = &filter.hotel_ids {
        builder
            .push(" AND hotel_id = ANY(")
            .push_bind(hotel_ids.clone())
            .push(")");
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
}

async fn insert_room_type<'e, E>(executor: E, rt: &RoomType) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "INSERT INTO room_types \
           (id, hotel_id, title, capacity_adults, quantity, price_per_night, \
            amenities, images, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(rt.id)
    .bind(rt.hotel_id)
    .bind(&rt.title)
    .bind(rt.capacity_adults)
    .bind(rt.quantity)
    .bind(rt.price_per_night)
    .bind(&rt.amenities)
    .bind(&rt.images)
    .bind(rt.created_at)
    .bind(rt.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

async fn update_hotel_row<'e, E>(executor: E, hotel: &Hotel) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "UPDATE hotels SET name = $2, city = $3, country = $4, images = $5, \
           description = $6, amenities = $7, rating = $8, currency = $9, \
           starting_price_per_night = $10, updated_at = $11 \
         WHERE id = $1",
    )
    .bind(hotel.id)
    .bind(&hotel.name)
    .bind(&hotel.city)
    .bind(&hotel.country)
    .bind(&hotel.images)
    .bind(&hotel.description)
    .bind(&hotel.amenities)
    .bind(hotel.rating)
    .bind(&hotel.currency)
    .bind(hotel.starting_price_per_night)
    .bind(hotel.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        sqlx::query(
            "INSERT INTO users \
               (id, first_name, last_name, email, phone, password_hash, role, \
                created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.map(User::try_from).transpose()
    }

    async fn find_hotel(&self, id: Uuid) -> StoreResult<Option<Hotel>> {
        sqlx::query_as::<_, Hotel>("SELECT * FROM hotels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn list_hotels(
        &self,
        filter: &HotelFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Hotel>, i64)> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {HOTEL_COLUMNS} FROM hotels"));
        push_hotel_filter(&mut builder, filter);
        if filter.sort_by_rating {
            builder.push(" ORDER BY rating DESC NULLS LAST, created_at DESC");
        } else {
            builder.push(" ORDER BY created_at DESC");
        }
        builder
            .push(" OFFSET ")
            .push_bind(offset)
            .push(" LIMIT ")
            .push_bind(limit);
        let hotels = builder
            .build_query_as::<Hotel>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM hotels");
        push_hotel_filter(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok((hotels, total))
    }

    async fn list_owner_hotels(&self, owner_id: Uuid) -> StoreResult<Vec<OwnerHotelSummary>> {
        let rows = sqlx::query_as::<_, OwnerHotelRow>(
            "SELECT h.*, \
               (SELECT COUNT(*) FROM bookings b WHERE b.hotel_id = h.id)::BIGINT \
                 AS total_bookings_count, \
               (SELECT COUNT(*) FROM bookings b \
                 WHERE b.hotel_id = h.id AND b.status = 'pending')::BIGINT \
                 AS active_requests_count, \
               COALESCE((SELECT SUM(rt.quantity) FROM room_types rt \
                 WHERE rt.hotel_id = h.id), 0)::BIGINT AS total_rooms_count \
             FROM hotels h \
             WHERE h.owner_id = $1 \
             ORDER BY h.created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(rows
            .into_iter()
            .map(|row| OwnerHotelSummary {
                hotel: row.hotel,
                total_bookings_count: row.total_bookings_count,
                active_requests_count: row.active_requests_count,
                total_rooms_count: row.total_rooms_count,
            })
            .collect())
    }

    async fn list_owner_hotel_ids(&self, owner_id: Uuid) -> StoreResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM hotels WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn list_room_types(&self, hotel_id: Uuid) -> StoreResult<Vec<RoomType>> {
        sqlx::query_as::<_, RoomType>(
            "SELECT * FROM room_types WHERE hotel_id = $1 ORDER BY created_at ASC",
        )
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)
    }

    async fn find_room_type_in_hotel(
        &self,
        hotel_id: Uuid,
        room_type_id: Uuid,
    ) -> StoreResult<Option<RoomType>> {
        sqlx::query_as::<_, RoomType>(
            "SELECT * FROM room_types WHERE id = $1 AND hotel_id = $2",
        )
        .bind(room_type_id)
        .bind(hotel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)
    }

    async fn insert_booking(&self, booking: Booking) -> StoreResult<Booking> {
        sqlx::query(
            "INSERT INTO bookings \
               (id, hotel_id, room_type_id, guest_id, check_in, check_out, \
                guests_adults, rooms_requested, currency, price_per_night, \
                total_amount, guest_full_name, guest_phone, guest_email, \
                guest_arrival_time, guest_notes, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
                     $14, $15, $16, $17, $18, $19)",
        )
        .bind(booking.id)
        .bind(booking.hotel_id)
        .bind(booking.room_type_id)
        .bind(booking.guest_id)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.guests_adults)
        .bind(booking.rooms_requested)
        .bind(&booking.currency)
        .bind(booking.price_per_night)
        .bind(booking.total_amount)
        .bind(&booking.guest_info.full_name)
        .bind(&booking.guest_info.phone)
        .bind(&booking.guest_info.email)
        .bind(&booking.guest_info.arrival_time)
        .bind(&booking.guest_info.notes)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(booking)
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Booking>, i64)> {
        let mut builder = QueryBuilder::new("SELECT * FROM bookings");
        push_booking_filter(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC OFFSET ")
            .push_bind(offset)
            .push(" LIMIT ")
            .push_bind(limit);
        let rows = builder
            .build_query_as::<BookingRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        let bookings = rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM bookings");
        push_booking_filter(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok((bookings, total))
    }

    async fn create_hotel_with_room_types(
        &self,
        hotel: Hotel,
        room_types: Vec<RoomType>,
    ) -> StoreResult<Hotel> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        sqlx::query(
            "INSERT INTO hotels \
               (id, owner_id, name, city, country, images, description, amenities, \
                rating, currency, starting_price_per_night, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(hotel.id)
        .bind(hotel.owner_id)
        .bind(&hotel.name)
        .bind(&hotel.city)
        .bind(&hotel.country)
        .bind(&hotel.images)
        .bind(&hotel.description)
        .bind(&hotel.amenities)
        .bind(hotel.rating)
        .bind(&hotel.currency)
        .bind(hotel.starting_price_per_night)
        .bind(hotel.created_at)
        .bind(hotel.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        for rt in &room_types {
            insert_room_type(&mut *tx, rt).await.map_err(map_sqlx_err)?;
        }

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(hotel)
    }

    async fn apply_hotel_sync(&self, plan: HotelSyncPlan) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        if !plan.delete.is_empty() {
            sqlx::query("DELETE FROM room_types WHERE hotel_id = $1 AND id = ANY($2)")
                .bind(plan.hotel.id)
                .bind(&plan.delete)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_err)?;
        }

        for rt in &plan.update {
            sqlx::query(
                "UPDATE room_types SET title = $3, capacity_adults = $4, quantity = $5, \
                   price_per_night = $6, amenities = $7, images = $8, updated_at = $9 \
                 WHERE id = $1 AND hotel_id = $2",
            )
            .bind(rt.id)
            .bind(rt.hotel_id)
            .bind(&rt.title)
            .bind(rt.capacity_adults)
            .bind(rt.quantity)
            .bind(rt.price_per_night)
            .bind(&rt.amenities)
            .bind(&rt.images)
            .bind(rt.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }

        for rt in &plan.create {
            insert_room_type(&mut *tx, rt).await.map_err(map_sqlx_err)?;
        }

        update_hotel_row(&mut *tx, &plan.hotel)
            .await
            .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn decide_booking(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        decision: OwnerDecision,
    ) -> StoreResult<Option<Booking>> {
        // Guarded UPDATE: the pending check and the write are one statement,
        // so two racing deciders cannot both succeed.
        let row = sqlx::query_as::<_, BookingRow>(
            "UPDATE bookings SET status = $2, decided_at = $3, decided_by = $4, \
               decision_reason = $5, updated_at = $3 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING *",
        )
        .bind(booking_id)
        .bind(status.as_str())
        .bind(decision.decided_at)
        .bind(decision.decided_by)
        .bind(&decision.reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        match row {
            Some(row) => Ok(Some(Booking::try_from(row)?)),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = $1)")
                        .bind(booking_id)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(map_sqlx_err)?;
                if exists {
                    Ok(None)
                } else {
                    Err(StoreError::NotFound(format!("booking {booking_id}")))
                }
            }
        }
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
