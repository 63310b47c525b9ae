use std::sync::Arc;

use axum::extract::FromRef;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, security_headers, Config};
use crate::handlers::{self, health_check};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

/// Lets extractors that only need the config (e.g. `AuthUser`) pull it
/// out of the shared state.
impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Arc<Config> {
        state.config.clone()
    }
}

pub fn create_routes(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/sign-up", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout));

    let hotel_routes = Router::new()
        .route("/", get(handlers::hotels::get_hotels))
        .route("/add-hotel", post(handlers::hotels::add_hotel))
        .route("/edit-hotel/:id", patch(handlers::hotels::edit_hotel))
        .route("/hotel-details/:id", get(handlers::hotels::hotel_details))
        .route("/owner-hotels", get(handlers::hotels::owner_hotels));

    let booking_routes = Router::new()
        .route("/create-booking", post(handlers::bookings::create_booking))
        .route("/my-bookings", get(handlers::bookings::my_bookings))
        .route(
            "/owner-booking-list",
            get(handlers::bookings::owner_booking_list),
        )
        .route("/:id/decision", patch(handlers::bookings::decide_booking));

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes)
        .nest("/api/hotels", hotel_routes)
        .nest("/api/booking", booking_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer())
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(state)
}
