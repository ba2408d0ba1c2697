// Explore feed layout engine.
// Implements: center selection, concurrent dimension probing, ring placement.
// Placement is CPU-bound and synchronous; async callers run it inside tokio::task::spawn_blocking.

pub mod center;
pub mod dimensions;
pub mod geometry;
pub mod rings;

// Re-export the public API consumed by the explore handlers.
pub use center::select_center;
pub use dimensions::{resolve_dimensions, DimensionProbe, HttpDimensionProbe, ProbeError};
pub use geometry::{ImageDimensions, LayoutBounds};
pub use rings::{layout_bounds, place_on_rings, PlacedImage, PlacementConfig};
