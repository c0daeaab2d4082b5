//! Front-face visibility test and sphere-to-canvas projection.

use glam::{Vec2, Vec3};

use crate::rotation::RotatedGrid;

/// Minimum depth a rotated vertex must have for its cell to be drawn.
///
/// Deliberately well above zero: near the horizon the projection divides by
/// a vanishing depth and blows up, so cells straddling it are dropped whole
/// rather than clipped. The resulting thin ring gap at the horizon is
/// accepted behavior. Empirical constant, kept configurable in
/// [`crate::SphereConfig`].
pub const HORIZON_EPSILON: f32 = 0.10;

pub const MIN_ZOOM: f32 = 0.18;
pub const INITIAL_ZOOM: f32 = 0.4;
pub const MAX_ZOOM: f32 = 0.8;

/// Viewport dimensions, passed explicitly per frame by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn diameter(&self) -> f32 {
        (self.width * self.width + self.height * self.height).sqrt()
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Projects a rotated vertex onto the canvas plane.
///
/// A cheap divide-by-depth scaled by zoom and the canvas diagonal, not a
/// calibrated pinhole camera. The result is relative to the canvas center;
/// the rasterizer translates by `canvas.center()` before painting. Assumes a
/// pre-clamped zoom factor and a depth safely above zero (see
/// [`cell_visible`]).
pub fn project(vertex: Vec3, canvas: CanvasSize, zoom: f32) -> Vec2 {
    let diameter = canvas.diameter();
    Vec2::new(
        zoom * diameter * vertex.x / vertex.z,
        zoom * diameter * vertex.y / vertex.z,
    )
}

/// True when all four corners of cell `(i, j)` face the viewer with depth
/// strictly greater than `epsilon`. The right edge wraps around the seam.
pub fn cell_visible(rotated: &RotatedGrid, i: usize, j: usize, epsilon: f32) -> bool {
    rotated.get(i, j).z > epsilon
        && rotated.get(i + 1, j).z > epsilon
        && rotated.get(i + 1, j + 1).z > epsilon
        && rotated.get(i, j + 1).z > epsilon
}
