use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::error::ApiError;
use super::render;
use super::SharedState;
use crate::catalog::{load_catalog_or_empty, OilRecord};
use crate::dashboard::{filter_view, index_view, prepare_catalog, FilterView, SortMode, Summary};
use crate::images::{safe_name, PLACEHOLDER_SVG};
use crate::scoring::{calculate_beneficial_score, calculate_score, Frequency, ScoredCatalog};

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub filter: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageParams {
    pub oil_name: Option<String>,
    pub botanical_name: Option<String>,
}

/// Fresh copy of the catalog from disk; empty when the file is missing or broken
async fn load_oils(state: &SharedState) -> Result<Vec<OilRecord>, ApiError> {
    let path = state.data_path.clone();
    tokio::task::spawn_blocking(move || load_catalog_or_empty(&path))
        .await
        .map_err(|err| ApiError::Internal(format!("catalog load task failed: {err}")))
}

/// Load the catalog and score all of it
async fn scored_catalog(state: &SharedState) -> Result<ScoredCatalog, ApiError> {
    let oils = load_oils(state).await?;
    Ok(prepare_catalog(oils, &state.config.scoring)?)
}

pub async fn index(
    State(state): State<SharedState>,
    Query(params): Query<IndexParams>,
) -> Result<Html<String>, ApiError> {
    let scored = scored_catalog(&state).await?;
    let view = index_view(&scored, &params.q, SortMode::parse(&params.filter));
    Ok(Html(render::index_page(&view)))
}

pub async fn filter(
    State(state): State<SharedState>,
    Path(mode): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<FilterView>, ApiError> {
    let scored = scored_catalog(&state).await?;
    Ok(Json(filter_view(&scored, &params.q, SortMode::parse(&mode))))
}

/// Detail page, served from the copy of the catalog loaded at startup
pub async fn oil_detail(
    State(state): State<SharedState>,
    Path(oil_id): Path<u32>,
) -> Result<Html<String>, ApiError> {
    let scoring = &state.config.scoring;
    let scored = prepare_catalog(state.detail_oils.clone(), scoring)?;

    let oil = scored
        .oils
        .iter()
        .find(|o| o.oil.oil_id == oil_id)
        .ok_or_else(|| ApiError::NotFound(format!("oil {oil_id} not found")))?;

    let score = calculate_score(&oil.oil, scoring, scored.most_blended_oil());
    let beneficial = calculate_beneficial_score(&oil.oil, scoring);
    Ok(Html(render::detail_page(oil, &score, &beneficial)))
}

pub async fn compounds(State(state): State<SharedState>) -> Result<Html<String>, ApiError> {
    let scored = scored_catalog(&state).await?;
    let summary = Summary::build(&scored);
    let rows = summary.component_freq.most_common(summary.component_freq.len());
    Ok(Html(render::frequency_page("Compounds", "compounds", "Component", rows)))
}

pub async fn blends(State(state): State<SharedState>) -> Result<Html<String>, ApiError> {
    let scored = scored_catalog(&state).await?;
    let rows = scored.blend_counts.most_common(scored.blend_counts.len());
    Ok(Html(render::frequency_page("Blends", "blends", "Oil", rows)))
}

pub async fn properties(State(state): State<SharedState>) -> Result<Html<String>, ApiError> {
    let scored = scored_catalog(&state).await?;
    let freq: Frequency = scored
        .oils
        .iter()
        .flat_map(|o| o.oil.therapeutic_properties.iter())
        .collect();
    let rows = freq.most_common(freq.len());
    Ok(Html(render::frequency_page("Properties", "properties", "Property", rows)))
}

pub async fn oil_image(
    State(state): State<SharedState>,
    Query(params): Query<ImageParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let blank = |s: &Option<String>| s.as_deref().map_or(true, |v| v.trim().is_empty());
    if blank(&params.oil_name) && blank(&params.botanical_name) {
        return Err(ApiError::BadRequest("Missing oil or botanical name".into()));
    }

    let image_url = state
        .images
        .resolve(params.oil_name.as_deref(), params.botanical_name.as_deref())
        .await;
    Ok(Json(json!({ "image_url": image_url })))
}

pub async fn image_bytes(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    if key.is_empty() || safe_name(&key) != key {
        return Err(ApiError::NotFound(format!("no image '{key}'")));
    }

    let cache = state.images.cache().clone();
    let lookup_key = key.clone();
    let found = tokio::task::spawn_blocking(move || cache.read_bytes(&lookup_key))
        .await
        .map_err(|err| ApiError::Internal(format!("image read task failed: {err}")))?;

    let (bytes, content_type) = found.ok_or_else(|| ApiError::NotFound(format!("no image '{key}'")))?;
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

pub async fn placeholder() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], PLACEHOLDER_SVG)
}

pub async fn health(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    let oils = load_oils(&state).await?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "oils": oils.len(),
    })))
}
