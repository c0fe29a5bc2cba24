//! REST API handlers.
//!
//! Each handler calls into the `Registry` and returns JSON responses.
//! Store failures map to 503 so callers know the operation is retryable.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use probegrid_registry::{RegistryError, ServiceSpec};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: String, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg),
        }),
    )
}

fn registry_error(e: &RegistryError) -> impl IntoResponse {
    let status = match e {
        RegistryError::AlreadyExists(_) => StatusCode::CONFLICT,
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::InvalidSpec(_) => StatusCode::BAD_REQUEST,
        // Retryable: the store itself failed.
        RegistryError::State(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(e.to_string(), status)
}

// ── Services ───────────────────────────────────────────────────

/// GET /api/v1/services
pub async fn list_services(State(state): State<ApiState>) -> impl IntoResponse {
    match state.registry.list_services() {
        Ok(services) => ApiResponse::ok(services).into_response(),
        Err(e) => registry_error(&e).into_response(),
    }
}

/// POST /api/v1/services
pub async fn register_service(
    State(state): State<ApiState>,
    Json(spec): Json<ServiceSpec>,
) -> impl IntoResponse {
    match state.registry.register_service(spec) {
        Ok(meta) => (StatusCode::CREATED, ApiResponse::ok(meta)).into_response(),
        Err(e) => registry_error(&e).into_response(),
    }
}

/// GET /api/v1/services/:name
pub async fn get_service(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.registry.get_service(&name) {
        Ok(meta) => ApiResponse::ok(meta).into_response(),
        Err(e) => registry_error(&e).into_response(),
    }
}

/// DELETE /api/v1/services/:name
pub async fn remove_service(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.registry.remove_service(&name) {
        Ok(true) => ApiResponse::ok("removed").into_response(),
        Ok(false) => error_response("service not found".to_string(), StatusCode::NOT_FOUND).into_response(),
        Err(e) => registry_error(&e).into_response(),
    }
}

// ── Targets ────────────────────────────────────────────────────

/// GET /api/v1/services/:name/targets
pub async fn list_targets(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.registry.list_assignments(&name) {
        Ok(assignments) => ApiResponse::ok(assignments).into_response(),
        Err(e) => registry_error(&e).into_response(),
    }
}

/// Assign request body.
#[derive(serde::Deserialize)]
pub struct AssignRequest {
    pub host: String,
    pub port: u16,
}

/// POST /api/v1/services/:name/targets
pub async fn assign_target(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(req): Json<AssignRequest>,
) -> impl IntoResponse {
    match state.registry.assign_target(&name, &req.host, req.port) {
        Ok(assignment) => (StatusCode::CREATED, ApiResponse::ok(assignment)).into_response(),
        Err(e) => registry_error(&e).into_response(),
    }
}

/// POST /api/v1/services/:name/targets/:target/reassign
pub async fn reassign_target(
    State(state): State<ApiState>,
    Path((name, target)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.registry.reassign_target(&name, &target) {
        Ok(assignment) => ApiResponse::ok(assignment).into_response(),
        Err(e) => registry_error(&e).into_response(),
    }
}

/// Claim request body.
#[derive(serde::Deserialize)]
pub struct ClaimRequest {
    pub process_id: u32,
}

/// POST /api/v1/services/:name/targets/:target/claim
pub async fn claim_target(
    State(state): State<ApiState>,
    Path((name, target)): Path<(String, String)>,
    Json(req): Json<ClaimRequest>,
) -> impl IntoResponse {
    match state.registry.claim_target(&name, &target, req.process_id) {
        Ok(assignment) => ApiResponse::ok(assignment).into_response(),
        Err(e) => registry_error(&e).into_response(),
    }
}

/// DELETE /api/v1/services/:name/targets/:target
pub async fn remove_target(
    State(state): State<ApiState>,
    Path((name, target)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.registry.remove_target(&name, &target) {
        Ok(true) => ApiResponse::ok("removed").into_response(),
        Ok(false) => error_response("target not found".to_string(), StatusCode::NOT_FOUND).into_response(),
        Err(e) => registry_error(&e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probegrid_registry::Registry;
    use probegrid_state::StateStore;

    fn test_state() -> ApiState {
        let store = StateStore::open_in_memory().unwrap();
        ApiState {
            registry: Registry::new(store),
        }
    }

    fn redis_spec() -> ServiceSpec {
        ServiceSpec {
            name: "redis".to_string(),
            db_type: "redis".to_string(),
            commands: vec!["info".to_string()],
            sample_count: 60,
            interval_seconds: 1,
            username: None,
            password: None,
        }
    }

    #[tokio::test]
    async fn list_services_empty() {
        let state = test_state();
        let resp = list_services(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_and_get_service() {
        let state = test_state();

        let resp = register_service(State(state.clone()), Json(redis_spec()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = get_service(State(state), Path("redis".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_duplicate_conflicts() {
        let state = test_state();
        state.registry.register_service(redis_spec()).unwrap();

        let resp = register_service(State(state), Json(redis_spec()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn register_invalid_spec_is_bad_request() {
        let state = test_state();
        let mut spec = redis_spec();
        spec.commands = vec![];

        let resp = register_service(State(state), Json(spec))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_nonexistent_service() {
        let state = test_state();
        let resp = get_service(State(state), Path("nope".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn assign_and_list_targets() {
        let state = test_state();
        state.registry.register_service(redis_spec()).unwrap();

        let req = AssignRequest {
            host: "127.0.0.1".to_string(),
            port: 6379,
        };
        let resp = assign_target(State(state.clone()), Path("redis".to_string()), Json(req))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = list_targets(State(state), Path("redis".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn assign_to_unknown_service_is_not_found() {
        let state = test_state();
        let req = AssignRequest {
            host: "127.0.0.1".to_string(),
            port: 6379,
        };
        let resp = assign_target(State(state), Path("nope".to_string()), Json(req))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn claim_reassign_remove_target() {
        let state = test_state();
        state.registry.register_service(redis_spec()).unwrap();
        let a = state
            .registry
            .assign_target("redis", "127.0.0.1", 6379)
            .unwrap();

        let resp = claim_target(
            State(state.clone()),
            Path(("redis".to_string(), a.target_id.clone())),
            Json(ClaimRequest { process_id: 4242 }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = reassign_target(
            State(state.clone()),
            Path(("redis".to_string(), a.target_id.clone())),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = remove_target(
            State(state.clone()),
            Path(("redis".to_string(), a.target_id.clone())),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = remove_target(
            State(state),
            Path(("redis".to_string(), a.target_id)),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn remove_service_roundtrip() {
        let state = test_state();
        state.registry.register_service(redis_spec()).unwrap();

        let resp = remove_service(State(state.clone()), Path("redis".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = remove_service(State(state), Path("redis".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
