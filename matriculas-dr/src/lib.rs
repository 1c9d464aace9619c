//! matriculas-dr library - dashboard data review service
//!
//! HTTP surface over the dataset gateway: browsing, cross-reference by
//! matricula, analytics, cache control and user registration.

use axum::Router;
use matriculas_common::users::UserRepository;
use matriculas_common::DatasetGateway;
use std::sync::Arc;

pub mod api;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<DatasetGateway>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn new(gateway: Arc<DatasetGateway>, users: Arc<dyn UserRepository>) -> Self {
        Self { gateway, users }
    }
}

/// True when `bind` names a loopback address
///
/// Identity is taken from a proxy-supplied header, so anything else exposes
/// role escalation to whoever can reach the port.
pub fn is_loopback_bind(bind: &str) -> bool {
    match bind.parse::<std::net::SocketAddr>() {
        Ok(addr) => addr.ip().is_loopback(),
        Err(_) => bind.starts_with("localhost:"),
    }
}

/// Build application router
///
/// `/health` and `/api/buildinfo` skip identity resolution; every other
/// route runs behind [`api::identity_middleware`] and checks its own role.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};
    use tower::ServiceBuilder;
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    let identified = Router::new()
        .route("/api/datasets", get(api::list_datasets))
        .route("/api/datasets/:key", get(api::get_dataset))
        .route("/api/datasets/:key/refresh", post(api::refresh_dataset))
        .route("/api/refresh", post(api::refresh_all))
        .route("/api/cache", delete(api::clear_all_caches))
        .route("/api/cache/:key", delete(api::clear_dataset_cache))
        .route("/api/matricula/:matricula", get(api::get_matricula))
        .route("/api/stats/cica", get(api::cica_stats))
        .route("/api/stats/reconocedores", get(api::reconocedores_stats))
        .route(
            "/api/stats/reconocedores/mutaciones/:field/:bucket",
            get(api::mutation_details),
        )
        .route("/api/login", post(api::login))
        .route("/api/users", post(api::register))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::identity_middleware,
        ));

    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(identified)
        .merge(public)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
