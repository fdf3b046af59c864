//! Router configuration for the Seatbook server.

use crate::api::{admin, reservations, seats};
use crate::state::AppState;
use axum::{
    extract::State,
    http::HeaderValue,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use seatbook_web::correlation_id_layer;
use seatbook_web::handlers::{health_check, readiness_check};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// `cors_origins` lists the browser origins allowed to call the API; when it
/// is empty no CORS layer is installed.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let member_routes = Router::new()
        .route("/seats/day", get(seats::list_seats_for_date))
        .route("/seats/available", get(seats::list_available_seats))
        .route("/reservations", post(reservations::book))
        .route("/reservations/mine", get(reservations::my_reservations))
        .route("/reservations/:id/cancel", post(reservations::cancel))
        .route("/reservations/:id/modify", post(reservations::modify));

    let admin_routes = Router::new()
        .route("/assignments", post(admin::manual_assign))
        .route("/reservations", get(admin::reservations_by_date))
        .route("/people/:id", put(admin::register_person))
        .route(
            "/people/:id/reservations",
            get(admin::reservations_by_person),
        )
        .route("/seats", get(admin::list_seats).post(admin::create_seat))
        .route(
            "/seats/:id",
            put(admin::update_seat).delete(admin::delete_seat),
        )
        .route("/reports/seat-usage", get(admin::seat_usage));

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready))
        .nest("/api", member_routes.nest("/admin", admin_routes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer());

    match cors_layer(cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    readiness_check(state.readiness.as_ref()).await
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
