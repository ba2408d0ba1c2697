//! Geometry helpers shared by the ring placement loop.
//!
//! Everything here works in the center-relative coordinate space: `(0, 0)` is the
//! middle of the canvas, `x` grows to the right and `y` grows downward (screen
//! convention), and rectangles are described by their top-left corner.

use std::collections::HashMap;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::placement::rings::PlacementConfig;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Natural pixel size of a post's image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: f64,
    pub height: f64,
}

impl ImageDimensions {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Square used whenever a probe fails or a post has no entry.
    pub const fn square(side: f64) -> Self {
        Self::new(side, side)
    }

    /// Finite and strictly positive on both axes.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Effective footprint used for all spacing math: `sqrt(w² + h²)`.
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }
}

/// Axis-aligned rectangle, top-left anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Padded overlap test.
    ///
    /// Both boxes are widened by `padding` on every side; they overlap unless a
    /// gap remains on at least one axis. Padded edges that exactly touch are
    /// treated as separated.
    pub fn overlaps_padded(&self, other: &Rect, padding: f64) -> bool {
        let separated = self.x + self.width + padding <= other.x - padding
            || other.x + other.width + padding <= self.x - padding
            || self.y + self.height + padding <= other.y - padding
            || other.y + other.height + padding <= self.y - padding;
        !separated
    }
}

/// Union bounding box of a finished layout (unpadded).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl LayoutBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Grows the box to cover `rect`.
    fn include(&mut self, rect: &Rect) {
        self.min_x = self.min_x.min(rect.x);
        self.min_y = self.min_y.min(rect.y);
        self.max_x = self.max_x.max(rect.x + rect.width);
        self.max_y = self.max_y.max(rect.y + rect.height);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Functions
// ────────────────────────────────────────────────────────────────────────────

/// Mean diagonal over every entry currently in the map.
///
/// The map may hold entries for posts that are not part of this run; they still
/// count. An empty map yields `fallback`.
pub fn average_diagonal(dimensions: &HashMap<String, ImageDimensions>, fallback: f64) -> f64 {
    if dimensions.is_empty() {
        return fallback;
    }
    let total: f64 = dimensions.values().map(ImageDimensions::diagonal).sum();
    total / dimensions.len() as f64
}

/// How many slots a ring of the given radius offers, clamped to the config range.
pub fn images_per_ring(radius: f64, avg_size: f64, config: &PlacementConfig) -> usize {
    let circumference = TAU * radius;
    let raw = (circumference / (avg_size + config.min_spacing)).floor();
    // NaN and negative values fall through to 0 and clamp up to the minimum.
    let slots = if raw.is_finite() && raw > 0.0 {
        raw.min(config.max_per_ring as f64) as usize
    } else if raw == f64::INFINITY {
        config.max_per_ring
    } else {
        0
    };
    slots.clamp(config.min_per_ring, config.max_per_ring)
}

/// Bounding box covering every rectangle, or `None` when there are none.
pub fn bounds_of<I>(rects: I) -> Option<LayoutBounds>
where
    I: IntoIterator<Item = Rect>,
{
    let mut iter = rects.into_iter();
    let first = iter.next()?;
    let mut bounds = LayoutBounds {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x + first.width,
        max_y: first.y + first.height,
    };
    for rect in iter {
        bounds.include(&rect);
    }
    Some(bounds)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
