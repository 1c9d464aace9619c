//! Gateway and HTTP data source against a local mock webhook server
//!
//! The mock serves each dataset at `/<endpoint path>` and counts requests,
//! so cache behavior can be observed from the outside.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use matriculas_common::cache::{KeyValueStore, MemoryStore, SqliteStore, TieredCache};
use matriculas_common::config::DashboardConfig;
use matriculas_common::db::init_database;
use matriculas_common::resolver::resolve;
use matriculas_common::source::{DataSource, HttpDataSource};
use matriculas_common::{DatasetGateway, DatasetKey, Error, FetchState};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Default)]
struct MockState {
    hits: AtomicUsize,
}

async fn serve_dataset(State(state): State<Arc<MockState>>, Path(name): Path<String>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let body = match name.as_str() {
        "r1" => json!({"data": [
            {"NUMERO_PREDIAL": "A1", "Propietario": "Ana"},
            {"NUMERO_PREDIAL": "B2", "Propietario": "Luis"},
            {"NUMERO_PREDIAL": "Z9", "Propietario": "Sin registro"}
        ]}),
        "r2" => json!({"data": [
            {"NUMERO_PREDIAL": "A1", "MATRICULA_INMOBILIARIA": "320-100"},
            {"NUMERO_PREDIAL": "B2", "MATRICULA_INMOBILIARIA": "200"},
            {"NUMERO_PREDIAL": "A1", "MATRICULA_INMOBILIARIA": "320-999"}
        ]}),
        "cica" => json!({"data": [{"Matricula": "320-100", "Usuario": "ana"}]}),
        "vur-general" => json!({"data": [{"Matricula": 100}]}),
        "broken" => return (StatusCode::OK, "<html>not json</html>").into_response(),
        "wrong-shape" => json!({"rows": []}),
        "down" => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => json!({"data": []}),
    };

    axum::Json(body).into_response()
}

/// Start the mock on an ephemeral port; returns its base URL
async fn start_mock() -> (String, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/:name", get(serve_dataset))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn source_for(base_url: &str) -> HttpDataSource {
    let config = DashboardConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    };
    HttpDataSource::from_config(&config).unwrap()
}

async fn gateway_for(base_url: &str) -> (TempDir, SqliteStore, DatasetGateway) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("matriculas.db")).await.unwrap();
    let uncapped = SqliteStore::new(pool);

    let cache = TieredCache::new(Arc::new(MemoryStore::default()), Arc::new(uncapped.clone()));
    let gateway = DatasetGateway::new(cache, Arc::new(source_for(base_url)));
    (dir, uncapped, gateway)
}

#[tokio::test]
async fn test_http_source_parses_dataset() {
    let (base_url, _state) = start_mock().await;
    let source = source_for(&base_url);

    let dataset = source.fetch(DatasetKey::Cica).await.unwrap();
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.data[0].text("Usuario"), "ana");
}

#[tokio::test]
async fn test_http_source_error_kinds() {
    let (base_url, _state) = start_mock().await;

    let mut endpoints = std::collections::HashMap::new();
    endpoints.insert(DatasetKey::Cica, format!("{}/down", base_url));
    endpoints.insert(DatasetKey::R1, format!("{}/broken", base_url));
    endpoints.insert(DatasetKey::R2, format!("{}/wrong-shape", base_url));
    let source = HttpDataSource::new(endpoints).unwrap();

    assert!(matches!(source.fetch(DatasetKey::Cica).await, Err(Error::Network(_))));
    assert!(matches!(source.fetch(DatasetKey::R1).await, Err(Error::Parse(_))));
    assert!(matches!(source.fetch(DatasetKey::R2).await, Err(Error::Parse(_))));
    assert!(matches!(source.fetch(DatasetKey::VurGeneral).await, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let source = source_for("http://127.0.0.1:1");
    assert!(matches!(source.fetch(DatasetKey::Cica).await, Err(Error::Network(_))));
}

#[tokio::test]
async fn test_r1_is_enriched_and_cached() {
    let (base_url, state) = start_mock().await;
    let (_dir, uncapped, gateway) = gateway_for(&base_url).await;

    let r1 = gateway.fetch_dataset(DatasetKey::R1).await.unwrap().unwrap();
    let derived: Vec<String> = r1.data.iter().map(|r| r.text("MATRICULA_INMOBILIARIA")).collect();
    assert_eq!(derived, vec!["320-100", "200", ""]);
    assert_eq!(state.hits.load(Ordering::SeqCst), 2);

    // Enriched form is what lands in the uncapped tier
    let stored = uncapped.get("database_r1").await.unwrap().unwrap();
    assert!(stored.contains("320-100"));

    let again = gateway.fetch_dataset(DatasetKey::R1).await.unwrap().unwrap();
    assert_eq!(again, r1);
    assert_eq!(state.hits.load(Ordering::SeqCst), 2);
    assert_eq!(gateway.fetch_state(DatasetKey::R1).await, FetchState::Cached);
}

#[tokio::test]
async fn test_uncapped_tier_serves_after_restart() {
    let (base_url, state) = start_mock().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("matriculas.db");

    for _ in 0..2 {
        let pool = init_database(&db_path).await.unwrap();
        let cache = TieredCache::new(
            Arc::new(MemoryStore::default()),
            Arc::new(SqliteStore::new(pool.clone())),
        );
        let gateway = DatasetGateway::new(cache, Arc::new(source_for(&base_url)));
        let cica = gateway.fetch_dataset(DatasetKey::Cica).await.unwrap();
        assert!(cica.is_some());
        pool.close().await;
    }

    // The second process start found the dataset in SQLite
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_fetch_returns_none_and_is_retried() {
    let (base_url, state) = start_mock().await;
    let mut endpoints = std::collections::HashMap::new();
    endpoints.insert(DatasetKey::Cica, format!("{}/down", base_url));

    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("matriculas.db")).await.unwrap();
    let cache = TieredCache::new(Arc::new(MemoryStore::default()), Arc::new(SqliteStore::new(pool)));
    let gateway = DatasetGateway::new(cache, Arc::new(HttpDataSource::new(endpoints).unwrap()));

    assert!(gateway.fetch_dataset(DatasetKey::Cica).await.unwrap().is_none());
    assert!(gateway.fetch_dataset(DatasetKey::Cica).await.unwrap().is_none());
    assert_eq!(state.hits.load(Ordering::SeqCst), 2);
    assert_eq!(gateway.fetch_state(DatasetKey::Cica).await, FetchState::Failed);
}

#[tokio::test]
async fn test_fetch_all_then_resolve() {
    let (base_url, _state) = start_mock().await;
    let (_dir, _uncapped, gateway) = gateway_for(&base_url).await;

    let all = gateway.fetch_all().await;
    assert_eq!(all.len(), 9);
    assert!(all.values().all(Option::is_some));

    let resolved = resolve("320-100", &all);
    assert_eq!(resolved[&DatasetKey::Cica].len(), 1);
    assert_eq!(resolved[&DatasetKey::VurGeneral].len(), 1);
    assert_eq!(resolved[&DatasetKey::R1].len(), 1);
    assert_eq!(resolved[&DatasetKey::R1][0].text("Propietario"), "Ana");
    assert!(resolved[&DatasetKey::Reconocedores].is_empty());
}

#[tokio::test]
async fn test_refresh_all_refetches_everything() {
    let (base_url, state) = start_mock().await;
    let (_dir, uncapped, gateway) = gateway_for(&base_url).await;

    gateway.fetch_all().await;
    // Nine datasets plus the live r2 fetch behind r1
    assert_eq!(state.hits.load(Ordering::SeqCst), 10);
    assert_eq!(uncapped.keys().await.unwrap().len(), 9);

    gateway.refresh_all().await.unwrap();
    assert_eq!(state.hits.load(Ordering::SeqCst), 20);

    gateway.clear_cache(Some(DatasetKey::Cica)).await.unwrap();
    assert_eq!(uncapped.keys().await.unwrap().len(), 8);
}
