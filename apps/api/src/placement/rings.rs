//! Ring placement: lays posts out on concentric rings around a center image.
//!
//! # Algorithm
//! 1. The center post goes first, at ring 0, centered on the origin.
//! 2. `avg_size` is the mean image diagonal over the whole dimension map.
//! 3. Ring 1 starts at `center_diagonal / 2 + avg_size / 2 + initial_buffer`.
//! 4. Each ring offers `images_per_ring` evenly spaced slots. Odd rings sweep
//!    clockwise from 0, even rings counter-clockwise from π.
//! 5. A slot is taken only if the next post's padded rectangle clears every image
//!    placed so far. A rejected slot is skipped; the post waits for the next slot.
//!    Each ring gets at most `2 × images_per_ring` attempts.
//! 6. The radius grows after every ring, by `0.8 × avg_size` when the ring stayed
//!    empty and `0.7 × avg_size + 80` otherwise, so the loop always terminates
//!    with every post placed.
//!
//! Placement is greedy and never backtracks: identical inputs give identical output.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Post;
use crate::placement::dimensions::FALLBACK_SIZE;
use crate::placement::geometry::{
    average_diagonal, bounds_of, images_per_ring, ImageDimensions, LayoutBounds, Rect,
};

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Tuning constants for the ring layout.
///
/// `Default` gives the values the explore feed renders with; tests and callers
/// that need a denser or looser layout can override individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Side of the square used for posts without usable dimensions. Also the
    /// `avg_size` when the dimension map is empty.
    pub fallback_size: f64,
    /// Extra arc length reserved per slot when computing ring capacity.
    pub min_spacing: f64,
    /// Margin added on every side of every image for the overlap test.
    pub padding: f64,
    /// Gap between the center image and the first ring.
    pub initial_buffer: f64,
    pub min_per_ring: usize,
    pub max_per_ring: usize,
    /// Radius growth after a ring that placed at least one image:
    /// `ring_growth_factor × avg_size + ring_growth_offset`.
    pub ring_growth_factor: f64,
    pub ring_growth_offset: f64,
    /// Radius growth after a ring that placed nothing: `empty_ring_growth_factor × avg_size`.
    pub empty_ring_growth_factor: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            fallback_size: FALLBACK_SIZE,
            min_spacing: 50.0,
            padding: 30.0,
            initial_buffer: 100.0,
            min_per_ring: 3,
            max_per_ring: 20,
            ring_growth_factor: 0.7,
            ring_growth_offset: 80.0,
            empty_ring_growth_factor: 0.8,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// A post positioned in center-relative space, ready to be drawn with a plain translate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedImage {
    pub post: Post,
    /// Top-left corner.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// 0 for the center image.
    pub ring_index: u32,
    /// Polar angle (radians) the position was derived from.
    pub angle_on_ring: f64,
}

impl PlacedImage {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Clockwise,
    CounterClockwise,
}

impl Sweep {
    fn start_angle(self) -> f64 {
        match self {
            Sweep::Clockwise => 0.0,
            Sweep::CounterClockwise => PI,
        }
    }

    /// Screen space has `y` pointing down, so increasing angles run clockwise.
    fn sign(self) -> f64 {
        match self {
            Sweep::Clockwise => 1.0,
            Sweep::CounterClockwise => -1.0,
        }
    }

    fn flip(self) -> Self {
        match self {
            Sweep::Clockwise => Sweep::CounterClockwise,
            Sweep::CounterClockwise => Sweep::Clockwise,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry points
// ────────────────────────────────────────────────────────────────────────────

/// Places every post around `center`.
///
/// The center is matched by id: any post sharing its id is not placed again.
/// Returns an empty vec when `posts` is empty.
pub fn place_on_rings(
    posts: &[Post],
    center: &Post,
    dimensions: &HashMap<String, ImageDimensions>,
    config: &PlacementConfig,
) -> Vec<PlacedImage> {
    if posts.is_empty() {
        return Vec::new();
    }

    let fallback = ImageDimensions::square(config.fallback_size);
    let dims_of = |post: &Post| {
        dimensions
            .get(&post.id)
            .copied()
            .filter(ImageDimensions::is_usable)
            .unwrap_or(fallback)
    };

    let mut placed: Vec<PlacedImage> = Vec::with_capacity(posts.len() + 1);

    let center_dims = dims_of(center);
    placed.push(PlacedImage {
        post: center.clone(),
        x: -center_dims.width / 2.0,
        y: -center_dims.height / 2.0,
        width: center_dims.width,
        height: center_dims.height,
        ring_index: 0,
        angle_on_ring: 0.0,
    });

    let remaining: Vec<&Post> = posts.iter().filter(|p| p.id != center.id).collect();
    if remaining.is_empty() {
        return placed;
    }

    let mut avg_size = average_diagonal(dimensions, config.fallback_size);
    if !avg_size.is_finite() || avg_size <= 0.0 {
        // Zero or broken entries would stall radius growth.
        avg_size = config.fallback_size;
    }

    let mut radius = center_dims.diagonal() / 2.0 + avg_size / 2.0 + config.initial_buffer;
    let mut ring_index: u32 = 1;
    let mut sweep = Sweep::Clockwise;
    let mut next = 0usize;

    while next < remaining.len() {
        let slots = images_per_ring(radius, avg_size, config);
        let step = TAU / slots as f64;
        let start = sweep.start_angle();
        let max_attempts = slots * 2;

        let mut placed_on_ring = 0usize;
        let mut attempt = 0usize;

        while next < remaining.len() && placed_on_ring < slots && attempt < max_attempts {
            let angle = start + sweep.sign() * attempt as f64 * step;
            attempt += 1;

            let post = remaining[next];
            let dims = dims_of(post);
            let candidate = Rect {
                x: angle.cos() * radius - dims.width / 2.0,
                y: angle.sin() * radius - dims.height / 2.0,
                width: dims.width,
                height: dims.height,
            };

            let blocked = placed
                .iter()
                .any(|p| p.rect().overlaps_padded(&candidate, config.padding));
            if blocked {
                continue;
            }

            placed.push(PlacedImage {
                post: post.clone(),
                x: candidate.x,
                y: candidate.y,
                width: candidate.width,
                height: candidate.height,
                ring_index,
                angle_on_ring: angle,
            });
            placed_on_ring += 1;
            next += 1;
        }

        debug!(
            ring = ring_index,
            radius, slots, placed_on_ring, "ring placement pass finished"
        );

        radius += if placed_on_ring == 0 {
            config.empty_ring_growth_factor * avg_size
        } else {
            config.ring_growth_factor * avg_size + config.ring_growth_offset
        };
        ring_index += 1;
        sweep = sweep.flip();
    }

    placed
}

/// Union box of a finished layout; `None` when nothing was placed.
pub fn layout_bounds(images: &[PlacedImage]) -> Option<LayoutBounds> {
    bounds_of(images.iter().map(PlacedImage::rect))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
