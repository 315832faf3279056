mod audit;
mod check;
mod contacts;
mod health;
mod quarantine;
mod telemetry;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::rate_limit_layer::rate_limit_check;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let check_route = Router::new()
        .route("/check", post(check::check))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_check,
        ));

    Router::new()
        .merge(check_route)
        .route("/health", get(health::health))
        .route(
            "/contacts",
            get(contacts::list_contacts).post(contacts::upsert_contact),
        )
        .route("/contacts/:identifier", delete(contacts::remove_contact))
        .route("/audit", get(audit::query_audit))
        .route("/telemetry", get(telemetry::query_telemetry))
        .route("/quarantine", get(quarantine::list_quarantine))
        .route(
            "/quarantine/:identifier/release",
            post(quarantine::release_quarantine),
        )
        .route(
            "/quarantine/:identifier",
            delete(quarantine::delete_quarantine),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
