//! probegrid-api — REST API for ProbeGrid.
//!
//! Provides axum route handlers for operators and discovery agents (writes)
//! and the collector fleet (reads).
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/services` | List registered service types |
//! | POST | `/api/v1/services` | Register a service type |
//! | GET | `/api/v1/services/:name` | Get service metadata |
//! | DELETE | `/api/v1/services/:name` | Remove a service type |
//! | GET | `/api/v1/services/:name/targets` | List target assignments |
//! | POST | `/api/v1/services/:name/targets` | Assign a target |
//! | POST | `/api/v1/services/:name/targets/:target/reassign` | Move a target to a fresh worker |
//! | POST | `/api/v1/services/:name/targets/:target/claim` | Record the claiming collector pid |
//! | DELETE | `/api/v1/services/:name/targets/:target` | Remove a target |

pub mod handlers;

use axum::Router;
use axum::routing::{delete, get, post};
use probegrid_registry::Registry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Registry,
}

/// Build the complete API router.
pub fn build_router(registry: Registry) -> Router {
    let api_state = ApiState { registry };

    let api_routes = Router::new()
        .route("/services", get(handlers::list_services).post(handlers::register_service))
        .route("/services/{name}", get(handlers::get_service).delete(handlers::remove_service))
        .route("/services/{name}/targets", get(handlers::list_targets).post(handlers::assign_target))
        .route("/services/{name}/targets/{target}", delete(handlers::remove_target))
        .route("/services/{name}/targets/{target}/reassign", post(handlers::reassign_target))
        .route("/services/{name}/targets/{target}/claim", post(handlers::claim_target))
        .with_state(api_state);

    Router::new().nest("/api/v1", api_routes)
}
