// Explore feed: turns a set of posts into a ring layout for the canvas renderer.
// Async orchestration only; the geometry lives in crate::placement.

pub mod handlers;

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::Post;
use crate::placement::{
    layout_bounds, place_on_rings, resolve_dimensions, select_center, DimensionProbe,
    ImageDimensions, LayoutBounds, PlacedImage, PlacementConfig,
};

/// Everything the renderer needs for one explore view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreLayout {
    pub center: Option<Post>,
    pub images: Vec<PlacedImage>,
    pub bounds: Option<LayoutBounds>,
}

impl ExploreLayout {
    pub fn empty() -> Self {
        Self {
            center: None,
            images: Vec::new(),
            bounds: None,
        }
    }
}

/// Full pipeline: pick a center, probe every image, place.
///
/// The center is drawn from `rng` before any probing starts.
pub async fn build_explore_layout<R>(
    posts: Vec<Post>,
    probe: &dyn DimensionProbe,
    config: &PlacementConfig,
    rng: &mut R,
) -> Result<ExploreLayout, AppError>
where
    R: Rng + Send + ?Sized,
{
    let Some(center) = select_center(&posts, rng).cloned() else {
        return Ok(ExploreLayout::empty());
    };

    let dimensions = resolve_dimensions(&posts, probe).await;
    layout_with_center(posts, center, dimensions, config.clone()).await
}

/// Places `posts` around a known center on the blocking pool.
pub async fn layout_with_center(
    posts: Vec<Post>,
    center: Post,
    dimensions: HashMap<String, ImageDimensions>,
    config: PlacementConfig,
) -> Result<ExploreLayout, AppError> {
    let post_count = posts.len();
    let center_id = center.id.clone();

    // CPU-bound: every candidate is checked against every placed image.
    let images = tokio::task::spawn_blocking(move || {
        place_on_rings(&posts, &center, &dimensions, &config)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in placement: {e}")))?;

    let bounds = layout_bounds(&images);
    let rings = images.last().map_or(0, |image| image.ring_index);

    let (width, height) = bounds.map_or((0.0, 0.0), |b| (b.width(), b.height()));

    info!(
        posts = post_count,
        placed = images.len(),
        rings,
        width,
        height,
        center = %center_id,
        "Explore layout computed"
    );

    Ok(ExploreLayout {
        center: images.first().map(|image| image.post.clone()),
        images,
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::placement::ProbeError;

    struct FixedProbe(ImageDimensions);

    #[async_trait]
    impl DimensionProbe for FixedProbe {
        async fn probe(&self, _image_url: &str) -> Result<ImageDimensions, ProbeError> {
            Ok(self.0)
        }
    }

    struct FailingProbe;

    #[async_trait]
    impl DimensionProbe for FailingProbe {
        async fn probe(&self, _image_url: &str) -> Result<ImageDimensions, ProbeError> {
            Err(ProbeError::EmptyImage)
        }
    }

    fn posts(n: usize) -> Vec<Post> {
        (0..n).map(|i| Post::sample(&format!("p{i}"))).collect()
    }

    #[tokio::test]
    async fn test_empty_posts_give_empty_layout() {
        let mut rng = StdRng::seed_from_u64(3);
        let layout = build_explore_layout(
            vec![],
            &FixedProbe(ImageDimensions::square(100.0)),
            &PlacementConfig::default(),
            &mut rng,
        )
        .await
        .unwrap();
        assert!(layout.center.is_none());
        assert!(layout.images.is_empty());
        assert!(layout.bounds.is_none());
    }

    #[tokio::test]
    async fn test_pipeline_places_every_post_around_chosen_center() {
        let input = posts(15);
        let mut rng = StdRng::seed_from_u64(11);
        let expected_center = select_center(&input, &mut StdRng::seed_from_u64(11))
            .unwrap()
            .id
            .clone();

        let layout = build_explore_layout(
            input,
            &FixedProbe(ImageDimensions::new(640.0, 480.0)),
            &PlacementConfig::default(),
            &mut rng,
        )
        .await
        .unwrap();

        assert_eq!(layout.images.len(), 15);
        assert_eq!(layout.center.as_ref().unwrap().id, expected_center);
        assert_eq!(layout.images[0].post.id, expected_center);
        assert_eq!(layout.images[0].x, -320.0);
        assert_eq!(layout.images[0].y, -240.0);
    }

    #[tokio::test]
    async fn test_pipeline_failed_probes_render_as_fallback_squares() {
        let mut rng = StdRng::seed_from_u64(5);
        let layout = build_explore_layout(
            posts(4),
            &FailingProbe,
            &PlacementConfig::default(),
            &mut rng,
        )
        .await
        .unwrap();
        assert_eq!(layout.images.len(), 4);
        assert!(layout
            .images
            .iter()
            .all(|image| image.width == 400.0 && image.height == 400.0));
    }

    #[tokio::test]
    async fn test_bounds_cover_every_image() {
        let input = posts(9);
        let dims: HashMap<String, ImageDimensions> = input
            .iter()
            .map(|p| (p.id.clone(), ImageDimensions::new(500.0, 300.0)))
            .collect();
        let center = input[0].clone();

        let layout = layout_with_center(input, center, dims, PlacementConfig::default())
            .await
            .unwrap();
        let bounds = layout.bounds.unwrap();
        for image in &layout.images {
            assert!(image.x >= bounds.min_x && image.y >= bounds.min_y);
            assert!(image.x + image.width <= bounds.max_x);
            assert!(image.y + image.height <= bounds.max_y);
        }
    }
}
