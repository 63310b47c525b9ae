//! End-to-end workflow tests over the in-memory store: booking admission,
//! the one-shot owner decision, and the hotel/room-type sync transaction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use roomora_server::models::booking::BookingStatus;
use roomora_server::services::bookings::{
    self, BookingListQuery, CreateBookingInput, GuestInfoInput,
};
use roomora_server::services::hotels::{self, CreateHotelInput, HotelPatch, RoomTypeInput};
use roomora_server::store::{InMemoryStore, Store};
use roomora_server::utils::error::AppError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn room_type_input(title: &str, capacity: i32, quantity: i32, price: i64) -> RoomTypeInput {
    RoomTypeInput {
        id: None,
        title: title.into(),
        capacity_adults: capacity,
        quantity,
        price_per_night: Decimal::from(price),
        amenities: vec![],
        images: vec![],
    }
}

fn hotel_input(room_types: Vec<RoomTypeInput>) -> CreateHotelInput {
    CreateHotelInput {
        name: "Harbor View".into(),
        city: "Lisbon".into(),
        country: "Portugal".into(),
        images: vec![],
        description: None,
        amenities: vec!["wifi".into()],
        rating: Some(4.5),
        currency: Some("EUR".into()),
        room_types,
    }
}

fn booking_input(hotel_id: Uuid, room_type_id: Uuid) -> CreateBookingInput {
    CreateBookingInput {
        hotel_id: hotel_id.to_string(),
        room_type_id: room_type_id.to_string(),
        check_in: date(2024, 1, 1),
        check_out: date(2024, 1, 3),
        guests_adults: 2,
        rooms_requested: 1,
        guest_info: GuestInfoInput {
            full_name: "  Ana Costa  ".into(),
            phone: "+351123456789".into(),
            email: None,
            arrival_time: None,
            notes: Some("  late check-in  ".into()),
        },
    }
}

fn default_page() -> BookingListQuery {
    BookingListQuery {
        page: None,
        limit: None,
        status: None,
    }
}

fn update_input(id: Uuid, title: &str, capacity: i32, quantity: i32, price: i64) -> RoomTypeInput {
    RoomTypeInput {
        id: Some(id.to_string()),
        ..room_type_input(title, capacity, quantity, price)
    }
}

#[tokio::test]
async fn hotel_creation_establishes_derived_price_and_roster() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();

    let hotel = hotels::create_hotel(
        &store,
        owner,
        hotel_input(vec![
            room_type_input("Double", 2, 4, 80),
            room_type_input("Suite", 4, 2, 200),
        ]),
    )
    .await
    .unwrap();

    assert_eq!(hotel.owner_id, owner);
    assert_eq!(hotel.starting_price_per_night, Decimal::from(80));
    assert_eq!(store.list_room_types(hotel.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn hotel_creation_requires_fields_and_room_types() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();

    let err = hotels::create_hotel(&store, owner, hotel_input(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NoRoomTypesProvided));

    let mut input = hotel_input(vec![room_type_input("Double", 2, 4, 80)]);
    input.city = "  ".into();
    let err = hotels::create_hotel(&store, owner, input).await.unwrap_err();
    assert!(matches!(err, AppError::MissingRequiredField(_)));
}

#[tokio::test]
async fn admission_snapshots_price_immutably() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    let guest = Uuid::new_v4();

    let hotel = hotels::create_hotel(
        &store,
        owner,
        hotel_input(vec![room_type_input("Double", 2, 4, 80)]),
    )
    .await
    .unwrap();
    let room_type = store.list_room_types(hotel.id).await.unwrap().remove(0);

    let booking =
        bookings::create_booking_request(&store, guest, booking_input(hotel.id, room_type.id))
            .await
            .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert!(booking.owner_decision.is_none());
    assert_eq!(booking.price_per_night, Decimal::from(80));
    // two nights, one room
    assert_eq!(booking.total_amount, Decimal::from(160));
    assert_eq!(booking.currency, "EUR");
    // guest info arrives trimmed
    assert_eq!(booking.guest_info.full_name, "Ana Costa");
    assert_eq!(booking.guest_info.notes, "late check-in");

    // Raise the room price afterwards; the booking's snapshot must not move.
    hotels::sync_hotel(
        &store,
        owner,
        &hotel.id.to_string(),
        HotelPatch::default(),
        vec![update_input(room_type.id, "Double", 2, 4, 120)],
    )
    .await
    .unwrap();

    let stored = store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.price_per_night, Decimal::from(80));
    assert_eq!(stored.total_amount, Decimal::from(160));
}

#[tokio::test]
async fn admission_rejects_bad_references_and_guest_info() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    let guest = Uuid::new_v4();

    let hotel = hotels::create_hotel(
        &store,
        owner,
        hotel_input(vec![room_type_input("Double", 2, 4, 80)]),
    )
    .await
    .unwrap();
    let other_hotel = hotels::create_hotel(
        &store,
        owner,
        hotel_input(vec![room_type_input("Twin", 2, 4, 60)]),
    )
    .await
    .unwrap();
    let foreign_rt = store.list_room_types(other_hotel.id).await.unwrap().remove(0);
    let room_type = store.list_room_types(hotel.id).await.unwrap().remove(0);

    let mut input = booking_input(hotel.id, room_type.id);
    input.hotel_id = "not-a-uuid".into();
    let err = bookings::create_booking_request(&store, guest, input)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidIdentifier(_)));

    let input = booking_input(Uuid::new_v4(), room_type.id);
    let err = bookings::create_booking_request(&store, guest, input)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::HotelNotFound));

    // A room type of some other hotel must not be bookable here.
    let input = booking_input(hotel.id, foreign_rt.id);
    let err = bookings::create_booking_request(&store, guest, input)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RoomTypeNotFound));

    let mut input = booking_input(hotel.id, room_type.id);
    input.guest_info.phone = "   ".into();
    let err = bookings::create_booking_request(&store, guest, input)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidGuestInfo(_)));
}

#[tokio::test]
async fn decision_is_one_shot_even_when_raced() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    let guest = Uuid::new_v4();

    let hotel = hotels::create_hotel(
        &store,
        owner,
        hotel_input(vec![room_type_input("Double", 2, 4, 80)]),
    )
    .await
    .unwrap();
    let room_type = store.list_room_types(hotel.id).await.unwrap().remove(0);
    let booking =
        bookings::create_booking_request(&store, guest, booking_input(hotel.id, room_type.id))
            .await
            .unwrap();
    let id = booking.id.to_string();

    // Two racing decisions: exactly one wins, the loser sees the state error.
    let (first, second) = tokio::join!(
        bookings::decide_booking(&store, owner, &id, "approved", None),
        bookings::decide_booking(&store, owner, &id, "rejected", Some("full".into())),
    );
    let outcomes = [first, second];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::InvalidBookingState))));

    // A later retry fails the same way, for either decision value.
    let err = bookings::decide_booking(&store, owner, &id, "approved", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidBookingState));

    let stored = store.find_booking(booking.id).await.unwrap().unwrap();
    let decision = stored.owner_decision.expect("decision stamped");
    assert_eq!(decision.decided_by, owner);
}

#[tokio::test]
async fn decision_validates_inputs_and_ownership() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    let guest = Uuid::new_v4();

    let hotel = hotels::create_hotel(
        &store,
        owner,
        hotel_input(vec![room_type_input("Double", 2, 4, 80)]),
    )
    .await
    .unwrap();
    let room_type = store.list_room_types(hotel.id).await.unwrap().remove(0);
    let booking =
        bookings::create_booking_request(&store, guest, booking_input(hotel.id, room_type.id))
            .await
            .unwrap();
    let id = booking.id.to_string();

    let err = bookings::decide_booking(&store, owner, "not-a-uuid", "approved", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidIdentifier(_)));

    let err = bookings::decide_booking(&store, owner, &id, "cancelled", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidDecision));

    let err = bookings::decide_booking(&store, owner, &Uuid::new_v4().to_string(), "approved", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BookingNotFound));

    // Someone else's owner id never gets through, however valid the rest is.
    let stranger = Uuid::new_v4();
    let err = bookings::decide_booking(&store, stranger, &id, "approved", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let stored = store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Pending);
}

#[tokio::test]
async fn sync_reconciles_roster_and_recomputes_price() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();

    let hotel = hotels::create_hotel(
        &store,
        owner,
        hotel_input(vec![
            room_type_input("Double", 2, 4, 80),
            room_type_input("Suite", 4, 2, 200),
        ]),
    )
    .await
    .unwrap();
    let existing = store.list_room_types(hotel.id).await.unwrap();
    let a = existing.iter().find(|rt| rt.title == "Double").unwrap();
    let b = existing.iter().find(|rt| rt.title == "Suite").unwrap();

    // Resubmit A updated plus a new C; B is omitted and therefore deleted.
    hotels::sync_hotel(
        &store,
        owner,
        &hotel.id.to_string(),
        HotelPatch {
            name: Some("Harbor View Renovated".into()),
            ..HotelPatch::default()
        },
        vec![
            update_input(a.id, "Double Deluxe", 2, 4, 90),
            room_type_input("Family", 3, 3, 70),
        ],
    )
    .await
    .unwrap();

    let roster = store.list_room_types(hotel.id).await.unwrap();
    assert_eq!(roster.len(), 2);
    let updated_a = roster.iter().find(|rt| rt.id == a.id).unwrap();
    assert_eq!(updated_a.title, "Double Deluxe");
    assert_eq!(updated_a.price_per_night, Decimal::from(90));
    assert!(roster.iter().all(|rt| rt.id != b.id));
    assert!(roster.iter().any(|rt| rt.title == "Family"));

    let stored = store.find_hotel(hotel.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Harbor View Renovated");
    assert_eq!(stored.starting_price_per_night, Decimal::from(70));
    assert_eq!(stored.owner_id, owner);
}

#[tokio::test]
async fn sync_failure_leaves_everything_untouched() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();

    let hotel = hotels::create_hotel(
        &store,
        owner,
        hotel_input(vec![
            room_type_input("Double", 2, 4, 80),
            room_type_input("Suite", 4, 2, 200),
        ]),
    )
    .await
    .unwrap();
    let before = store.list_room_types(hotel.id).await.unwrap();
    let a = before.iter().find(|rt| rt.title == "Double").unwrap();

    // The new room type is malformed, so the whole sync must be a no-op.
    let err = hotels::sync_hotel(
        &store,
        owner,
        &hotel.id.to_string(),
        HotelPatch::default(),
        vec![
            update_input(a.id, "Double Deluxe", 2, 4, 90),
            room_type_input("Broken", 2, 2, -1),
        ],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let after = store.list_room_types(hotel.id).await.unwrap();
    assert_eq!(after.len(), 2);
    let untouched_a = after.iter().find(|rt| rt.id == a.id).unwrap();
    assert_eq!(untouched_a.title, "Double");
    assert_eq!(untouched_a.price_per_night, Decimal::from(80));

    let stored = store.find_hotel(hotel.id).await.unwrap().unwrap();
    assert_eq!(stored.starting_price_per_night, Decimal::from(80));

    // Emptying the roster is refused the same all-or-nothing way.
    let err = hotels::sync_hotel(
        &store,
        owner,
        &hotel.id.to_string(),
        HotelPatch::default(),
        vec![],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NoRoomTypesRemaining));
    assert_eq!(store.list_room_types(hotel.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn sync_enforces_ownership() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();

    let hotel = hotels::create_hotel(
        &store,
        owner,
        hotel_input(vec![room_type_input("Double", 2, 4, 80)]),
    )
    .await
    .unwrap();
    let rt = store.list_room_types(hotel.id).await.unwrap().remove(0);

    let err = hotels::sync_hotel(
        &store,
        Uuid::new_v4(),
        &hotel.id.to_string(),
        HotelPatch::default(),
        vec![update_input(rt.id, "Double", 2, 4, 80)],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn booking_lists_scope_to_caller() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    let guest = Uuid::new_v4();

    let hotel = hotels::create_hotel(
        &store,
        owner,
        hotel_input(vec![room_type_input("Double", 2, 4, 80)]),
    )
    .await
    .unwrap();
    let room_type = store.list_room_types(hotel.id).await.unwrap().remove(0);
    bookings::create_booking_request(&store, guest, booking_input(hotel.id, room_type.id))
        .await
        .unwrap();

    let (metadata, views) = bookings::my_bookings(&store, guest, default_page())
        .await
        .unwrap();
    assert_eq!(metadata.total_items, 1);
    assert_eq!(views.len(), 1);
    let hotel_ref = views[0].hotel.as_ref().expect("hotel ref attached");
    assert_eq!(hotel_ref.name, "Harbor View");
    assert!(views[0].guest.is_none());

    // Another guest sees nothing.
    let (metadata, views) = bookings::my_bookings(&store, Uuid::new_v4(), default_page())
        .await
        .unwrap();
    assert_eq!(metadata.total_items, 0);
    assert!(views.is_empty());

    // The owner's request list carries guest references; an owner without
    // hotels gets a clean empty page.
    let (metadata, views) = bookings::owner_booking_requests(&store, owner, default_page())
        .await
        .unwrap();
    assert_eq!(metadata.total_items, 1);
    assert!(views[0].hotel.is_some());
    assert!(views[0].room_type.is_some());

    let (metadata, views) =
        bookings::owner_booking_requests(&store, Uuid::new_v4(), default_page())
            .await
            .unwrap();
    assert_eq!(metadata.total_items, 0);
    assert!(views.is_empty());
}
