//! Dataset browsing, refresh and cache invalidation
//!
//! Browsing needs `viewer`, a single-dataset refresh `recognizer`, and a
//! full refresh or cache clear `admin`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use matriculas_common::search::filter_records;
use matriculas_common::{DatasetKey, FetchState, Record, Role};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::{require_role, CurrentUser};
use super::ApiError;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

pub(crate) fn parse_key(key: &str) -> Result<DatasetKey, ApiError> {
    key.parse::<DatasetKey>().map_err(ApiError::from)
}

#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub key: DatasetKey,
    pub name: &'static str,
    pub identifier_column: &'static str,
    pub state: FetchState,
}

/// GET /api/datasets
///
/// Catalog with each dataset's last fetch state. Does not fetch anything.
pub async fn list_datasets(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<DatasetSummary>>, ApiError> {
    require_role(&state, &current, Role::Viewer)?;

    let mut summaries = Vec::with_capacity(DatasetKey::ALL.len());
    for key in DatasetKey::ALL {
        summaries.push(DatasetSummary {
            key,
            name: key.display_name(),
            identifier_column: key.identifier_column(),
            state: state.gateway.fetch_state(key).await,
        });
    }

    Ok(Json(summaries))
}

#[derive(Debug, Deserialize)]
pub struct DatasetQuery {
    /// Case-insensitive search term
    #[serde(default)]
    pub q: String,

    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

#[derive(Debug, Serialize)]
pub struct DatasetPageResponse {
    pub key: DatasetKey,
    pub name: &'static str,
    /// Records matching the search term
    pub total_records: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

/// GET /api/datasets/:key?q=&page=
pub async fn get_dataset(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(key): Path<String>,
    Query(query): Query<DatasetQuery>,
) -> Result<Json<DatasetPageResponse>, ApiError> {
    require_role(&state, &current, Role::Viewer)?;
    let key = parse_key(&key)?;

    let dataset = state
        .gateway
        .fetch_dataset(key)
        .await?
        .ok_or(ApiError::Unavailable(key))?;

    let matches = filter_records(&dataset.data, query.q.trim());
    let pagination = calculate_pagination(matches.len(), query.page);

    Ok(Json(DatasetPageResponse {
        key,
        name: key.display_name(),
        total_records: matches.len(),
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        columns: dataset.columns(),
        records: pagination.slice(&matches).iter().map(|r| (*r).clone()).collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub key: DatasetKey,
    pub records: usize,
}

/// POST /api/datasets/:key/refresh
pub async fn refresh_dataset(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(key): Path<String>,
) -> Result<Json<RefreshResponse>, ApiError> {
    require_role(&state, &current, Role::Recognizer)?;
    let key = parse_key(&key)?;

    let dataset = state
        .gateway
        .refresh(key)
        .await?
        .ok_or(ApiError::Unavailable(key))?;

    Ok(Json(RefreshResponse {
        key,
        records: dataset.len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct RefreshAllResponse {
    pub loaded: Vec<DatasetKey>,
    pub failed: Vec<DatasetKey>,
}

/// POST /api/refresh
///
/// Partial failure still answers 200; failed keys are listed.
pub async fn refresh_all(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<RefreshAllResponse>, ApiError> {
    require_role(&state, &current, Role::Admin)?;

    let results = state.gateway.refresh_all().await?;
    let (loaded, failed): (Vec<_>, Vec<_>) = results.iter().partition(|(_, d)| d.is_some());

    let response = RefreshAllResponse {
        loaded: loaded.into_iter().map(|(&k, _)| k).collect(),
        failed: failed.into_iter().map(|(&k, _)| k).collect(),
    };
    info!(loaded = response.loaded.len(), failed = response.failed.len(), "Refreshed all datasets");

    Ok(Json(response))
}

/// DELETE /api/cache
pub async fn clear_all_caches(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    require_role(&state, &current, Role::Admin)?;
    state.gateway.clear_cache(None).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/cache/:key
pub async fn clear_dataset_cache(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_role(&state, &current, Role::Admin)?;
    let key = parse_key(&key)?;
    state.gateway.clear_cache(Some(key)).await?;
    Ok(StatusCode::NO_CONTENT)
}
