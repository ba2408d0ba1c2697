//! Axum route handlers for the Explore API.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::errors::AppError;
use crate::explore::{build_explore_layout, layout_with_center, ExploreLayout};
use crate::feed::normalize_hashtag;
use crate::models::Post;
use crate::placement::{resolve_dimensions, select_center, ImageDimensions};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExploreQuery {
    pub hashtag: Option<String>,
    /// Fixes the center choice so a view can be reproduced.
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    pub posts: Vec<Post>,
    /// Already-resolved sizes. When absent, images are probed.
    pub dimensions: Option<HashMap<String, ImageDimensions>>,
    pub center_id: Option<String>,
    pub seed: Option<u64>,
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/explore
///
/// Fetches posts (optionally filtered by hashtag) and returns their ring layout.
pub async fn handle_explore(
    State(state): State<AppState>,
    Query(params): Query<ExploreQuery>,
) -> Result<Json<ExploreLayout>, AppError> {
    let hashtag = params.hashtag.as_deref().and_then(normalize_hashtag);
    let posts = state.posts.fetch_posts(hashtag.as_deref()).await?;

    let mut rng = rng_for(params.seed);
    let layout =
        build_explore_layout(posts, state.probe.as_ref(), &state.placement, &mut rng).await?;

    Ok(Json(layout))
}

/// POST /api/v1/explore/layout
///
/// Lays out caller-supplied posts. Skips probing when `dimensions` is given.
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<ExploreLayout>, AppError> {
    if let Some(dimensions) = &request.dimensions {
        if let Some((id, _)) = dimensions.iter().find(|(_, d)| !d.is_usable()) {
            return Err(AppError::Validation(format!(
                "dimensions for post '{id}' must be positive and finite"
            )));
        }
    }

    let center = match &request.center_id {
        Some(id) => Some(
            request
                .posts
                .iter()
                .find(|p| &p.id == id)
                .cloned()
                .ok_or_else(|| {
                    AppError::Validation(format!("center_id '{id}' is not one of the posts"))
                })?,
        ),
        None => select_center(&request.posts, &mut rng_for(request.seed)).cloned(),
    };

    let Some(center) = center else {
        return Ok(Json(ExploreLayout::empty()));
    };

    let dimensions = match request.dimensions {
        Some(dimensions) => dimensions,
        None => resolve_dimensions(&request.posts, state.probe.as_ref()).await,
    };

    let layout =
        layout_with_center(request.posts, center, dimensions, state.placement.clone()).await?;
    Ok(Json(layout))
}
