//! Analytics endpoints for the CICA and reconocedores datasets
//!
//! Statistics are recomputed from the (usually cached) dataset per request.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use matriculas_common::stats::{mutation_bucket_label, CicaStats, MutationField, MutationStats, ReconocedoresStats};
use matriculas_common::{Dataset, DatasetKey, Record, Role};
use serde::Serialize;

use super::auth::{require_role, CurrentUser};
use super::ApiError;
use crate::AppState;

async fn load(state: &AppState, current: &CurrentUser, key: DatasetKey) -> Result<Dataset, ApiError> {
    require_role(state, current, Role::Viewer)?;
    state
        .gateway
        .fetch_dataset(key)
        .await?
        .ok_or(ApiError::Unavailable(key))
}

/// GET /api/stats/cica
pub async fn cica_stats(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<CicaStats>, ApiError> {
    let dataset = load(&state, &current, DatasetKey::Cica).await?;
    Ok(Json(CicaStats::compute(&dataset.data)))
}

/// GET /api/stats/reconocedores
pub async fn reconocedores_stats(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ReconocedoresStats>, ApiError> {
    let dataset = load(&state, &current, DatasetKey::Reconocedores).await?;
    Ok(Json(ReconocedoresStats::compute(&dataset.data)))
}

#[derive(Debug, Serialize)]
pub struct MutationDetailResponse {
    pub field: &'static str,
    pub bucket: String,
    pub label: String,
    pub count: usize,
    pub records: Vec<Record>,
}

/// GET /api/stats/reconocedores/mutaciones/:field/:bucket
///
/// `field` is `1` for MUTACIONES and `2` for MUTACIONES2.
pub async fn mutation_details(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((field, bucket)): Path<(String, String)>,
) -> Result<Json<MutationDetailResponse>, ApiError> {
    let field = field
        .parse::<u8>()
        .ok()
        .and_then(MutationField::from_index)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown mutation field: {}", field)))?;
    let dataset = load(&state, &current, DatasetKey::Reconocedores).await?;

    let stats = MutationStats::compute(&dataset.data);
    let records = stats.details(field, &bucket).to_vec();

    Ok(Json(MutationDetailResponse {
        field: field.column(),
        label: mutation_bucket_label(&bucket),
        count: records.len(),
        bucket,
        records,
    }))
}
