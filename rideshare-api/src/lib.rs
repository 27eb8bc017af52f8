use axum::{
    http::Method,
    routing::get,
    Json, Router,
};
use rideshare_core::repository::MarketplaceStore;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod error;
pub mod rides;
pub mod state;
pub mod users;

pub use state::AppState;

pub fn app<S: MarketplaceStore>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/health", get(health))
        .merge(users::routes::<S>())
        .merge(rides::routes::<S>())
        .merge(bookings::routes::<S>())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}
