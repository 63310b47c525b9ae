//! Hotel workflows: creation, the room-type sync transaction, and the
//! public/owner listing operations.
//!
//! The sync follows a plan-then-commit shape: the full target state is
//! computed and validated in memory as an explicit three-list diff
//! (update / create / delete), the starting price is recomputed over the
//! planned roster, and only then is the whole plan handed to the store's
//! atomic apply. A failure at any point before the commit leaves the
//! hotel and its room types untouched.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::hotel::{Hotel, OwnerHotelSummary};
use crate::models::room_type::RoomType;
use crate::store::{HotelFilter, HotelSyncPlan, Store};
use crate::utils::error::AppError;
use crate::utils::pagination::{paginate, PageMetadata, PageParams};

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Deserialize)]
pub struct RoomTypeInput {
    /// Present for updates, absent for new room types.
    pub id: Option<String>,
    pub title: String,
    pub capacity_adults: i32,
    pub quantity: i32,
    pub price_per_night: Decimal,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHotelInput {
    pub name: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub rating: Option<f32>,
    pub currency: Option<String>,
    #[serde(default)]
    pub room_types: Vec<RoomTypeInput>,
}

/// Patchable hotel fields. `owner_id` and `starting_price_per_night` are
/// deliberately not part of this type; the former is immutable and the
/// latter is derived inside the creation/sync transactions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HotelPatch {
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub images: Option<Vec<String>>,
    pub description: Option<String>,
    pub amenities: Option<Vec<String>>,
    pub rating: Option<f32>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HotelListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    /// Flag: any value switches the sort to rating, high to low.
    pub rating: Option<String>,
    /// Comma-separated; every listed amenity must match.
    pub amenities: Option<String>,
    /// Upper bound on the starting price per night.
    pub price: Option<Decimal>,
}

fn validate_room_type_fields(input: &RoomTypeInput) -> Result<(), AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::MissingRequiredField(
            "Room type title is required".into(),
        ));
    }
    if input.capacity_adults < 1 {
        return Err(AppError::ValidationError(
            "capacity_adults must be >= 1".into(),
        ));
    }
    if input.quantity < 1 {
        return Err(AppError::ValidationError("quantity must be >= 1".into()));
    }
    if input.price_per_night < Decimal::ZERO {
        return Err(AppError::ValidationError(
            "price_per_night must be >= 0".into(),
        ));
    }
    Ok(())
}

fn validate_rating(rating: Option<f32>) -> Result<(), AppError> {
    if let Some(r) = rating {
        if !(0.0..=5.0).contains(&r) {
            return Err(AppError::ValidationError(
                "rating must be between 0 and 5".into(),
            ));
        }
    }
    Ok(())
}

fn min_price(room_types: &[RoomType]) -> Decimal {
    room_types
        .iter()
        .map(|rt| rt.price_per_night)
        .min()
        .unwrap_or(Decimal::ZERO)
}

/// Creates a hotel together with its initial room types as one atomic
/// store operation. The starting price is computed from the provided room
/// types; a client-supplied value is never read.
pub async fn create_hotel(
    store: &dyn Store,
    owner_id: Uuid,
    input: CreateHotelInput,
) -> Result<Hotel, AppError> {
    let name = input.name.trim();
    let city = input.city.trim();
    let country = input.country.trim();
    if name.is_empty() || city.is_empty() || country.is_empty() {
        return Err(AppError::MissingRequiredField(
            "name, city, country are required".into(),
        ));
    }
    if input.room_types.is_empty() {
        return Err(AppError::NoRoomTypesProvided);
    }
    validate_rating(input.rating)?;

    let now = Utc::now();
    let hotel_id = Uuid::new_v4();

    let mut room_types = Vec::with_capacity(input.room_types.len());
    for rt in &input.room_types {
        validate_room_type_fields(rt)?;
        room_types.push(RoomType {
            id: Uuid::new_v4(),
            hotel_id,
            title: rt.title.trim().to_string(),
            capacity_adults: rt.capacity_adults,
            quantity: rt.quantity,
            price_per_night: rt.price_per_night,
            amenities: rt.amenities.clone(),
            images: rt.images.clone(),
            created_at: now,
            updated_at: now,
        });
    }

    let currency = input
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_string();

    let hotel = Hotel {
        id: hotel_id,
        owner_id,
        name: name.to_string(),
        city: city.to_string(),
        country: country.to_string(),
        images: input.images,
        description: input.description,
        amenities: input.amenities,
        rating: input.rating,
        currency,
        starting_price_per_night: min_price(&room_types),
        created_at: now,
        updated_at: now,
    };

    let created = store
        .create_hotel_with_room_types(hotel, room_types)
        .await?;
    tracing::info!(hotel_id = %created.id, owner_id = %owner_id, "hotel created");
    Ok(created)
}

/// Computes the full target state for one sync: the patched hotel with its
/// recomputed starting price, plus disjoint update/create/delete lists.
/// Pure; everything is validated here so the store apply cannot fail on
/// caller input.
fn plan_room_type_sync(
    hotel: &Hotel,
    existing: &[RoomType],
    patch: HotelPatch,
    incoming: &[RoomTypeInput],
) -> Result<HotelSyncPlan, AppError> {
    let now = Utc::now();
    let mut target = hotel.clone();

    if let Some(name) = patch.name {
        target.name = name.trim().to_string();
    }
    if let Some(city) = patch.city {
        target.city = city.trim().to_string();
    }
    if let Some(country) = patch.country {
        target.country = country.trim().to_string();
    }
    if target.name.is_empty() || target.city.is_empty() || target.country.is_empty() {
        return Err(AppError::MissingRequiredField(
            "name, city, country are required".into(),
        ));
    }
    if let Some(images) = patch.images {
        target.images = images;
    }
    if let Some(description) = patch.description {
        target.description = Some(description);
    }
    if let Some(amenities) = patch.amenities {
        target.amenities = amenities;
    }
    if patch.rating.is_some() {
        validate_rating(patch.rating)?;
        target.rating = patch.rating;
    }
    if let Some(currency) = patch.currency {
        let currency = currency.trim().to_string();
        if !currency.is_empty() {
            target.currency = currency;
        }
    }
    target.updated_at = now;

    let mut update = Vec::new();
    let mut create = Vec::new();
    let mut incoming_ids = Vec::new();

    for rt in incoming {
        validate_room_type_fields(rt)?;
        match &rt.id {
            Some(raw) => {
                let id = Uuid::parse_str(raw)
                    .map_err(|_| AppError::InvalidRoomTypeId("Invalid room type id".into()))?;
                let current = existing
                    .iter()
                    .find(|e| e.id == id)
                    .ok_or_else(|| {
                        AppError::InvalidRoomTypeId(
                            "Room type does not belong to this hotel".into(),
                        )
                    })?;
                incoming_ids.push(id);
                update.push(RoomType {
                    id,
                    hotel_id: hotel.id,
                    title: rt.title.trim().to_string(),
                    capacity_adults: rt.capacity_adults,
                    quantity: rt.quantity,
                    price_per_night: rt.price_per_night,
                    amenities: rt.amenities.clone(),
                    images: rt.images.clone(),
                    created_at: current.created_at,
                    updated_at: now,
                });
            }
            None => create.push(RoomType {
                id: Uuid::new_v4(),
                hotel_id: hotel.id,
                title: rt.title.trim().to_string(),
                capacity_adults: rt.capacity_adults,
                quantity: rt.quantity,
                price_per_night: rt.price_per_night,
                amenities: rt.amenities.clone(),
                images: rt.images.clone(),
                created_at: now,
                updated_at: now,
            }),
        }
    }

    // Deletion by omission: anything the caller didn't resubmit goes away.
    let delete: Vec<Uuid> = existing
        .iter()
        .map(|rt| rt.id)
        .filter(|id| !incoming_ids.contains(id))
        .collect();

    // The roster after this sync is exactly update + create.
    if update.is_empty() && create.is_empty() {
        return Err(AppError::NoRoomTypesRemaining);
    }
    target.starting_price_per_night = update
        .iter()
        .chain(&create)
        .map(|rt| rt.price_per_night)
        .min()
        .unwrap_or(Decimal::ZERO);

    Ok(HotelSyncPlan {
        hotel: target,
        update,
        create,
        delete,
    })
}

/// Reconciles a hotel's room-type roster to the caller-submitted desired
/// state and re-derives the starting price, all-or-nothing. Callers must
/// submit the full roster; omitted room types are deleted.
pub async fn sync_hotel(
    store: &dyn Store,
    owner_id: Uuid,
    hotel_id: &str,
    patch: HotelPatch,
    room_types: Vec<RoomTypeInput>,
) -> Result<(), AppError> {
    let hotel_id = Uuid::parse_str(hotel_id)
        .map_err(|_| AppError::InvalidIdentifier("Invalid hotel id format".into()))?;

    let hotel = store
        .find_hotel(hotel_id)
        .await?
        .ok_or(AppError::HotelNotFound)?;
    if hotel.owner_id != owner_id {
        return Err(AppError::Forbidden("not your hotel".into()));
    }

    let existing = store.list_room_types(hotel_id).await?;
    let plan = plan_room_type_sync(&hotel, &existing, patch, &room_types)?;

    let (updated, created, deleted) =
        (plan.update.len(), plan.create.len(), plan.delete.len());
    store.apply_hotel_sync(plan).await?;
    tracing::info!(
        hotel_id = %hotel_id,
        updated,
        created,
        deleted,
        "hotel and room types synced"
    );
    Ok(())
}

pub async fn list_hotels(
    store: &dyn Store,
    query: HotelListQuery,
) -> Result<(PageMetadata, Vec<Hotel>), AppError> {
    let amenities = query
        .amenities
        .as_deref()
        .map(|csv| {
            csv.split(',')
                .map(|a| a.trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let filter = HotelFilter {
        search: query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        amenities,
        price_up_to: query.price,
        sort_by_rating: query.rating.is_some(),
    };

    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = (params.page(), params.limit());
    let (hotels, total) = store.list_hotels(&filter, params.offset(), limit).await?;
    Ok((paginate(total, page, limit), hotels))
}

pub async fn hotel_details(
    store: &dyn Store,
    hotel_id: &str,
) -> Result<(Hotel, Vec<RoomType>), AppError> {
    let hotel_id = Uuid::parse_str(hotel_id)
        .map_err(|_| AppError::InvalidIdentifier("Invalid hotel id format".into()))?;
    let hotel = store
        .find_hotel(hotel_id)
        .await?
        .ok_or(AppError::HotelNotFound)?;
    let room_types = store.list_room_types(hotel_id).await?;
    Ok((hotel, room_types))
}

pub async fn owner_hotels(
    store: &dyn Store,
    owner_id: Uuid,
) -> Result<Vec<OwnerHotelSummary>, AppError> {
    Ok(store.list_owner_hotels(owner_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn hotel(owner_id: Uuid) -> Hotel {
        let now = Utc::now();
        Hotel {
            id: Uuid::new_v4(),
            owner_id,
            name: "Harbor View".into(),
            city: "Lisbon".into(),
            country: "Portugal".into(),
            images: vec![],
            description: None,
            amenities: vec![],
            rating: None,
            currency: "USD".into(),
            starting_price_per_night: Decimal::from(80),
            created_at: now,
            updated_at: now,
        }
    }

    fn room_type(hotel_id: Uuid, title: &str, price: i64, created_at: DateTime<Utc>) -> RoomType {
        RoomType {
            id: Uuid::new_v4(),
            hotel_id,
            title: title.into(),
            capacity_adults: 2,
            quantity: 4,
            price_per_night: Decimal::from(price),
            amenities: vec![],
            images: vec![],
            created_at,
            updated_at: created_at,
        }
    }

    fn input_for(rt: &RoomType) -> RoomTypeInput {
        RoomTypeInput {
            id: Some(rt.id.to_string()),
            title: rt.title.clone(),
            capacity_adults: rt.capacity_adults,
            quantity: rt.quantity,
            price_per_night: rt.price_per_night,
            amenities: rt.amenities.clone(),
            images: rt.images.clone(),
        }
    }

    fn new_input(title: &str, price: i64) -> RoomTypeInput {
        RoomTypeInput {
            id: None,
            title: title.into(),
            capacity_adults: 2,
            quantity: 2,
            price_per_night: Decimal::from(price),
            amenities: vec![],
            images: vec![],
        }
    }

    #[test]
    fn plan_partitions_into_three_disjoint_lists() {
        let h = hotel(Uuid::new_v4());
        let now = Utc::now();
        let a = room_type(h.id, "Double", 80, now);
        let b = room_type(h.id, "Suite", 200, now);
        let existing = vec![a.clone(), b.clone()];

        let mut a_input = input_for(&a);
        a_input.price_per_night = Decimal::from(90);
        let incoming = vec![a_input, new_input("Family", 70)];

        let plan =
            plan_room_type_sync(&h, &existing, HotelPatch::default(), &incoming).unwrap();

        assert_eq!(plan.update.len(), 1);
        assert_eq!(plan.update[0].id, a.id);
        assert_eq!(plan.update[0].price_per_night, Decimal::from(90));
        // updates keep their original creation time
        assert_eq!(plan.update[0].created_at, a.created_at);

        assert_eq!(plan.create.len(), 1);
        assert_eq!(plan.create[0].title, "Family");

        assert_eq!(plan.delete, vec![b.id]);
    }

    #[test]
    fn plan_recomputes_starting_price_over_post_sync_roster() {
        let h = hotel(Uuid::new_v4());
        let now = Utc::now();
        let a = room_type(h.id, "Double", 80, now);
        let existing = vec![a.clone()];

        let incoming = vec![input_for(&a), new_input("Family", 70)];
        let plan =
            plan_room_type_sync(&h, &existing, HotelPatch::default(), &incoming).unwrap();
        assert_eq!(plan.hotel.starting_price_per_night, Decimal::from(70));
    }

    #[test]
    fn plan_rejects_malformed_room_type_before_anything_is_planned() {
        let h = hotel(Uuid::new_v4());
        let now = Utc::now();
        let a = room_type(h.id, "Double", 80, now);
        let existing = vec![a.clone()];

        let mut bad = new_input("Family", 70);
        bad.price_per_night = Decimal::from(-1);
        let incoming = vec![input_for(&a), bad];

        let err = plan_room_type_sync(&h, &existing, HotelPatch::default(), &incoming)
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn plan_rejects_foreign_and_malformed_ids() {
        let h = hotel(Uuid::new_v4());
        let now = Utc::now();
        let existing = vec![room_type(h.id, "Double", 80, now)];

        let mut foreign = new_input("Other", 50);
        foreign.id = Some(Uuid::new_v4().to_string());
        let err = plan_room_type_sync(&h, &existing, HotelPatch::default(), &[foreign])
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRoomTypeId(_)));

        let mut malformed = new_input("Other", 50);
        malformed.id = Some("not-a-uuid".into());
        let err = plan_room_type_sync(&h, &existing, HotelPatch::default(), &[malformed])
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRoomTypeId(_)));
    }

    #[test]
    fn plan_refuses_to_leave_hotel_without_room_types() {
        let h = hotel(Uuid::new_v4());
        let now = Utc::now();
        let existing = vec![room_type(h.id, "Double", 80, now)];

        let err =
            plan_room_type_sync(&h, &existing, HotelPatch::default(), &[]).unwrap_err();
        assert!(matches!(err, AppError::NoRoomTypesRemaining));
    }

    #[test]
    fn patch_cannot_blank_required_fields_or_touch_derived_ones() {
        let h = hotel(Uuid::new_v4());
        let now = Utc::now();
        let a = room_type(h.id, "Double", 80, now);
        let existing = vec![a.clone()];

        let patch = HotelPatch {
            name: Some("   ".into()),
            ..HotelPatch::default()
        };
        let err =
            plan_room_type_sync(&h, &existing, patch, &[input_for(&a)]).unwrap_err();
        assert!(matches!(err, AppError::MissingRequiredField(_)));

        // owner never changes through the sync path
        let plan = plan_room_type_sync(
            &h,
            &existing,
            HotelPatch {
                name: Some("Renamed".into()),
                ..HotelPatch::default()
            },
            &[input_for(&a)],
        )
        .unwrap();
        assert_eq!(plan.hotel.owner_id, h.owner_id);
        assert_eq!(plan.hotel.name, "Renamed");
    }
}
