use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use rideshare_api::{app, AppState};
use rideshare_core::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    app(AppState::new(Arc::new(MemoryStore::new())))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, name: &str) -> i64 {
    let (status, body) = call(
        app,
        Method::POST,
        "/users/register",
        Some(json!({ "name": name, "email": format!("{name}@example.com") })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn publish(app: &Router, owner_id: i64, seats: i32, fare: i64) -> i64 {
    let (status, body) = call(
        app,
        Method::POST,
        "/rides",
        Some(json!({
            "ownerId": owner_id,
            "source": "Pune",
            "destination": "Mumbai",
            "seats": seats,
            "farePerSeat": fare
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn book(app: &Router, ride_id: i64, user_id: i64, seats: i32) -> (StatusCode, Value) {
    call(
        app,
        Method::POST,
        "/bookings",
        Some(json!({ "rideId": ride_id, "userId": user_id, "seats": seats })),
    )
    .await
}

async fn seats_of(app: &Router, owner_id: i64, ride_id: i64) -> i64 {
    let (_, rides) = call(app, Method::GET, &format!("/rides/owner/{owner_id}"), None).await;
    rides
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"].as_i64() == Some(ride_id))
        .unwrap()["seats"]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "UP" }));
}

#[tokio::test]
async fn test_booking_lifecycle_over_http() {
    let app = test_app();
    let owner = register(&app, "owner").await;
    let rider_one = register(&app, "rider1").await;
    let rider_two = register(&app, "rider2").await;
    let ride = publish(&app, owner, 3, 100).await;

    let (status, booking) = book(&app, ride, rider_one, 2).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["totalFare"], 200);
    assert_eq!(booking["seatsBooked"], 2);
    assert_eq!(seats_of(&app, owner, ride).await, 1);
    let booking_id = booking["id"].as_i64().unwrap();

    let (status, body) = book(&app, ride, rider_two, 2).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Not enough seats: requested 2, available 1");
    assert_eq!(seats_of(&app, owner, ride).await, 1);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/bookings/{booking_id}?userId={rider_two}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, mine) = call(&app, Method::GET, &format!("/bookings/{rider_one}"), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/bookings/{booking_id}?userId={rider_one}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "cancelled": true }));
    assert_eq!(seats_of(&app, owner, ride).await, 3);

    let (_, mine) = call(&app, Method::GET, &format!("/bookings/{rider_one}"), None).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_ride_is_not_found() {
    let app = test_app();
    let rider = register(&app, "rider").await;
    let (status, _) = book(&app, 4242, rider, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_booking_requests_are_rejected() {
    let app = test_app();
    let owner = register(&app, "owner").await;
    let rider = register(&app, "rider").await;
    let ride = publish(&app, owner, 3, 100).await;

    let (status, _) = book(&app, ride, rider, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&app, 0, rider, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&app, ride, 9_999, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/bookings")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::DELETE, "/bookings/1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(seats_of(&app, owner, ride).await, 3);
}

#[tokio::test]
async fn test_register_is_idempotent_by_email() {
    let app = test_app();
    let first = register(&app, "asha").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/register",
        Some(json!({ "name": "Someone Else", "email": "  asha@example.com " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_i64(), Some(first));
    assert_eq!(body["name"], "asha");

    let (status, body) = call(&app, Method::GET, "/users/login?email=asha@example.com", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_i64(), Some(first));

    let (status, _) = call(&app, Method::GET, "/users/login?email=nobody@example.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/users/login", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/users/register",
        Some(json!({ "name": " ", "email": "x@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/register",
        Some(json!({ "name": "n".repeat(101), "email": "long@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name must be at most 100 characters");
}

#[tokio::test]
async fn test_ride_listing_search_and_cancel() {
    let app = test_app();
    let owner = register(&app, "owner").await;
    let other = register(&app, "other").await;
    let ride = publish(&app, owner, 2, 50).await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/rides",
        Some(json!({ "ownerId": owner, "source": "Goa", "destination": "Pune", "seats": 0, "farePerSeat": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/rides",
        Some(json!({ "ownerId": 777, "source": "Goa", "destination": "Pune", "seats": 2, "farePerSeat": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::POST,
        "/rides",
        Some(json!({ "ownerId": owner, "source": "x".repeat(81), "destination": "Pune", "seats": 2, "farePerSeat": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, rides) = call(&app, Method::GET, "/rides?source=Pune&destination=Mumbai", None).await;
    assert_eq!(rides.as_array().unwrap().len(), 1);
    assert_eq!(rides[0]["farePerSeat"], 50);
    assert_eq!(rides[0]["status"], "OPEN");

    let (_, rides) = call(&app, Method::GET, "/rides?source=Pune&destination=Delhi", None).await;
    assert!(rides.as_array().unwrap().is_empty());

    let (status, _) = call(&app, Method::DELETE, &format!("/rides/{ride}?ownerId={other}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::DELETE, &format!("/rides/{ride}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::DELETE, &format!("/rides/{ride}?ownerId={owner}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "cancelled": true }));

    let (_, rides) = call(&app, Method::GET, "/rides", None).await;
    assert!(rides.as_array().unwrap().is_empty());

    let (status, _) = book(&app, ride, other, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, owned) = call(&app, Method::GET, &format!("/rides/owner/{owner}"), None).await;
    assert_eq!(owned[0]["status"], "CANCELLED");
}

#[tokio::test]
async fn test_concurrent_http_bookings_do_not_oversell() {
    let app = test_app();
    let owner = register(&app, "owner").await;
    let rider = register(&app, "rider").await;
    let ride = publish(&app, owner, 4, 25).await;

    let attempts = (0..12).map(|_| {
        let app = app.clone();
        async move { book(&app, ride, rider, 1).await.0 }
    });
    let statuses = futures_util::future::join_all(attempts).await;

    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
    assert_eq!(created, 4);
    assert_eq!(conflicts, 8);
    assert_eq!(seats_of(&app, owner, ride).await, 0);
}
