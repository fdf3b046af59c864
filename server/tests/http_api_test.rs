//! Router tests against the in-memory store.
//!
//! Requests go through the full router with `oneshot`, so extractors,
//! error mapping and middleware are all exercised.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use seatbook_core::{BoxFuture, NewSeat, PersonDirectory, PersonId, Seat, SeatDirectory};
use seatbook_runtime::{EngineConfig, Stores};
use seatbook_server::build_router;
use seatbook_server::AppState;
use seatbook_testing::{FixedClock, InMemoryStore};
use seatbook_web::{ReadinessProbe, CORRELATION_ID_HEADER, PERSON_ID_HEADER, PERSON_ROLE_HEADER};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const DAY: &str = "2025-06-10";

/// Readiness backed by the in-memory store's availability switch.
struct StoreProbe(InMemoryStore);

impl ReadinessProbe for StoreProbe {
    fn component(&self) -> &'static str {
        "memory"
    }

    fn check(&self) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(async move {
            self.0
                .person(PersonId::new())
                .await
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
    }
}

struct Harness {
    store: InMemoryStore,
    app: Router,
    ada: PersonId,
    bob: PersonId,
    admin: PersonId,
}

fn harness() -> Harness {
    let store = InMemoryStore::new();
    let ada = store.add_member("Ada");
    let bob = store.add_member("Bob");
    let admin = store.add_admin("Grace");

    let state = AppState::new(
        Stores::shared(Arc::new(store.clone())),
        Arc::new(FixedClock::at("2025-06-09T10:00:00Z").unwrap()),
        EngineConfig::default(),
        Arc::new(StoreProbe(store.clone())),
    );

    Harness {
        app: build_router(state, &[]),
        store,
        ada,
        bob,
        admin,
    }
}

impl Harness {
    async fn seat(&self, number: u32) -> Seat {
        self.store
            .create_seat(NewSeat::new(number, DAY.parse().unwrap()).at("Annex"))
            .await
            .unwrap()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        caller: Option<(PersonId, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((person, role)) = caller {
            builder = builder
                .header(PERSON_ID_HEADER, person.to_string())
                .header(PERSON_ROLE_HEADER, role);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn book(&self, person: PersonId, seat: &Seat) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/reservations",
            Some((person, "member")),
            Some(json!({ "seat_id": seat.id, "date": DAY })),
        )
        .await
    }
}

#[tokio::test]
async fn test_booking_returns_created_reservation() {
    let h = harness();
    let seat = h.seat(1).await;

    let (status, body) = h.book(h.ada, &seat).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["seat_id"], json!(seat.id));
    assert_eq!(body["person_id"], json!(h.ada));
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn test_taken_seat_is_a_conflict_with_code() {
    let h = harness();
    let seat = h.seat(1).await;
    h.book(h.ada, &seat).await;

    let (status, body) = h.book(h.bob, &seat).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SEAT_TAKEN");
    assert!(body["message"].as_str().unwrap().contains(DAY));
}

#[tokio::test]
async fn test_second_booking_same_day_is_rejected() {
    let h = harness();
    let first = h.seat(1).await;
    let second = h.seat(2).await;
    h.book(h.ada, &first).await;

    let (status, body) = h.book(h.ada, &second).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "PERSON_ALREADY_BOOKED");
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let h = harness();
    let (status, body) = h
        .send(Method::GET, &format!("/api/seats/day?date={DAY}"), None, None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_members_cannot_use_admin_routes() {
    let h = harness();
    let (status, body) = h
        .send(
            Method::GET,
            &format!("/api/admin/reservations?date={DAY}"),
            Some((h.ada, "member")),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_malformed_input_is_a_validation_error() {
    let h = harness();

    let (status, body) = h
        .send(
            Method::POST,
            "/api/reservations",
            Some((h.ada, "member")),
            Some(json!({ "seat_id": "nope", "date": DAY })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION");

    let (status, _) = h
        .send(
            Method::GET,
            "/api/seats/day?date=10-06-2025",
            Some((h.ada, "member")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_cancel_then_modify_flow() {
    let h = harness();
    let first = h.seat(1).await;
    let second = h.seat(2).await;
    let (_, booked) = h.book(h.ada, &first).await;
    let id = booked["id"].as_str().unwrap().to_string();

    let (status, moved) = h
        .send(
            Method::POST,
            &format!("/api/reservations/{id}/modify"),
            Some((h.ada, "member")),
            Some(json!({ "seat_id": second.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["seat_id"], json!(second.id));

    // Bob cannot cancel Ada's reservation.
    let moved_id = moved["id"].as_str().unwrap().to_string();
    let (status, _) = h
        .send(
            Method::POST,
            &format!("/api/reservations/{moved_id}/cancel"),
            Some((h.bob, "member")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, cancelled) = h
        .send(
            Method::POST,
            &format!("/api/reservations/{moved_id}/cancel"),
            Some((h.ada, "member")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (status, mine) = h
        .send(
            Method::GET,
            "/api/reservations/mine",
            Some((h.ada, "member")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_occupants_are_visible_to_admins_only() {
    let h = harness();
    let seat = h.seat(1).await;
    h.seat(2).await;
    h.book(h.ada, &seat).await;
    let uri = format!("/api/seats/day?date={DAY}");

    let (_, as_member) = h.send(Method::GET, &uri, Some((h.bob, "member")), None).await;
    let seats = as_member.as_array().unwrap();
    assert_eq!(seats.len(), 2);
    assert_eq!(seats[0]["occupied"], true);
    assert!(seats[0].get("occupant").is_none());

    let (_, as_admin) = h
        .send(Method::GET, &uri, Some((h.admin, "administrator")), None)
        .await;
    assert_eq!(as_admin[0]["occupant"]["display_name"], "Ada");

    let (_, free) = h
        .send(
            Method::GET,
            &format!("/api/seats/available?date={DAY}"),
            Some((h.bob, "member")),
            None,
        )
        .await;
    assert_eq!(free.as_array().unwrap().len(), 1);
    assert_eq!(free[0]["seat_number"], 2);
}

#[tokio::test]
async fn test_admin_seat_lifecycle() {
    let h = harness();
    let admin = Some((h.admin, "administrator"));

    let (status, seat) = h
        .send(
            Method::POST,
            "/api/admin/seats",
            admin,
            Some(json!({ "seat_number": 4, "offered_date": DAY, "amenities": ["monitor"] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let seat_id = seat["id"].as_str().unwrap().to_string();

    let (status, body) = h
        .send(
            Method::POST,
            "/api/admin/seats",
            admin,
            Some(json!({ "seat_number": 4, "offered_date": DAY })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CATALOG_CONFLICT");

    let (status, updated) = h
        .send(
            Method::PUT,
            &format!("/api/admin/seats/{seat_id}"),
            admin,
            Some(json!({ "location": "Quiet Room" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["location"], "Quiet Room");

    let (status, assigned) = h
        .send(
            Method::POST,
            "/api/admin/assignments",
            admin,
            Some(json!({ "person_id": h.bob, "seat_id": seat_id, "date": DAY })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = h
        .send(Method::DELETE, &format!("/api/admin/seats/{seat_id}"), admin, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CATALOG_CONFLICT");

    let reservation_id = assigned["id"].as_str().unwrap();
    h.send(
        Method::POST,
        &format!("/api/reservations/{reservation_id}/cancel"),
        Some((h.bob, "member")),
        None,
    )
    .await;

    let (status, _) = h
        .send(Method::DELETE, &format!("/api/admin/seats/{seat_id}"), admin, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, seats) = h
        .send(Method::GET, "/api/admin/seats", admin, None)
        .await;
    assert!(seats.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_listings_and_usage_report() {
    let h = harness();
    let admin = Some((h.admin, "administrator"));
    let seat = h.seat(1).await;
    h.book(h.ada, &seat).await;

    let (status, by_date) = h
        .send(
            Method::GET,
            &format!("/api/admin/reservations?date={DAY}"),
            admin,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_date.as_array().unwrap().len(), 1);

    let (status, by_person) = h
        .send(
            Method::GET,
            &format!("/api/admin/people/{}/reservations", h.ada),
            admin,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_person["reservations"].as_array().unwrap().len(), 1);

    let (status, report) = h
        .send(
            Method::GET,
            "/api/admin/reports/seat-usage?start=2025-06-01&end=2025-06-30&location=all",
            admin,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        report,
        json!([{
            "seat_number": 1,
            "location": "Annex",
            "total_reservations": 1,
            "unique_people": 1
        }])
    );
}

#[tokio::test]
async fn test_health_and_readiness() {
    let h = harness();

    let (status, body) = h.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = h.send(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    h.store.set_unavailable(true);
    let (status, body) = h.send(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);
}

#[tokio::test]
async fn test_responses_carry_a_correlation_id() {
    let h = harness();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));
}

#[tokio::test]
async fn test_registered_person_can_be_assigned_a_seat() {
    let h = harness();
    let admin = Some((h.admin, "administrator"));
    let seat = h.seat(3).await;
    let newcomer = PersonId::new();
    let assign = json!({ "person_id": newcomer, "seat_id": seat.id, "date": DAY });

    let (status, body) = h
        .send(Method::POST, "/api/admin/assignments", admin, Some(assign.clone()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let uri = format!("/api/admin/people/{newcomer}");
    let record = json!({ "role": "member", "display_name": "Lin", "email": "lin@example.com" });

    let (status, _) = h
        .send(Method::PUT, &uri, Some((h.ada, "member")), Some(record.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h
        .send(
            Method::PUT,
            &uri,
            admin,
            Some(json!({ "role": "member", "display_name": "Lin", "email": "lin" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION");

    let (status, person) = h.send(Method::PUT, &uri, admin, Some(record)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(person["id"], json!(newcomer));

    let (status, assigned) = h
        .send(Method::POST, "/api/admin/assignments", admin, Some(assign))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(assigned["person_id"], json!(newcomer));

    let (_, seats) = h
        .send(Method::GET, &format!("/api/seats/day?date={DAY}"), admin, None)
        .await;
    assert_eq!(seats[0]["occupant"]["display_name"], "Lin");

    let (status, history) = h
        .send(
            Method::GET,
            &format!("/api/admin/people/{newcomer}/reservations"),
            admin,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["person"]["email"], "lin@example.com");
}
