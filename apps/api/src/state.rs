use std::sync::Arc;

use crate::feed::PostSource;
use crate::placement::{DimensionProbe, PlacementConfig};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Where explore posts come from. Default: `RestPostSource` against POSTS_API_URL.
    pub posts: Arc<dyn PostSource>,
    /// Image size lookup. Default: `HttpDimensionProbe`.
    pub probe: Arc<dyn DimensionProbe>,
    /// Ring layout constants used for every explore request.
    pub placement: PlacementConfig,
}
