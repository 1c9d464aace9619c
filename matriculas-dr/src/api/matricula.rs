//! Matricula cross-reference view

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use matriculas_common::matricula::normalize;
use matriculas_common::resolver::{datasets_with_matches, resolve};
use matriculas_common::{DatasetKey, Record, Role};
use serde::Serialize;
use std::collections::BTreeMap;

use super::auth::{require_role, CurrentUser};
use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MatriculaResponse {
    pub matricula: String,
    pub normalized: String,
    /// Every dataset key, with its matching records
    pub results: BTreeMap<DatasetKey, Vec<Record>>,
    /// Keys with at least one match
    pub matched: Vec<DatasetKey>,
    /// Keys whose dataset could not be fetched
    pub unavailable: Vec<DatasetKey>,
}

/// GET /api/matricula/:matricula
///
/// Fetches all nine datasets (mostly from cache) and collects every record
/// for the matricula. Unavailable datasets contribute empty lists.
pub async fn get_matricula(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(matricula): Path<String>,
) -> Result<Json<MatriculaResponse>, ApiError> {
    require_role(&state, &current, Role::Viewer)?;

    let normalized = normalize(&matricula);
    if normalized.is_empty() {
        return Err(ApiError::BadRequest("Matricula must not be empty".to_string()));
    }

    let datasets = state.gateway.fetch_all().await;
    let unavailable = datasets
        .iter()
        .filter(|(_, d)| d.is_none())
        .map(|(&k, _)| k)
        .collect();

    let results = resolve(&matricula, &datasets);
    let matched = datasets_with_matches(&results);

    Ok(Json(MatriculaResponse {
        matricula,
        normalized,
        results,
        matched,
        unavailable,
    }))
}
