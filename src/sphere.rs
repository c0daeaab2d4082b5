//! The sphere instance: bound bitmap, orientation state and the render
//! driver that pairs visible cells with their mosaic tiles.

use glam::{Mat3, Vec2};
use image::RgbaImage;

use crate::grid::{BreakingPoints, GridConfig, VertexGrid};
use crate::mosaic::Mosaic;
use crate::projection::{self, CanvasSize};
use crate::rotation::{self, RotatedGrid};
use crate::SphereError;

/// Tunables for a sphere instance. The epsilon and the frame correction are
/// empirically chosen; changing them changes visible output, so they are
/// carried as configuration with documented defaults rather than re-derived.
#[derive(Debug, Clone, Copy)]
pub struct SphereConfig {
    pub grid: GridConfig,
    /// Visibility margin, see [`projection::HORIZON_EPSILON`].
    pub horizon_epsilon: f32,
    /// Reference-frame roll, see [`rotation::FRAME_CORRECTION`].
    pub frame_correction: f32,
    pub min_zoom: f32,
    pub initial_zoom: f32,
    pub max_zoom: f32,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig {
                width: 30,
                height: 30,
            },
            horizon_epsilon: projection::HORIZON_EPSILON,
            frame_correction: rotation::FRAME_CORRECTION,
            min_zoom: projection::MIN_ZOOM,
            initial_zoom: projection::INITIAL_ZOOM,
            max_zoom: projection::MAX_ZOOM,
        }
    }
}

/// Destination quadrilateral for one tile, in the corner order the
/// rasterizer expects: top-left, top-right, bottom-left, bottom-right.
/// Coordinates are relative to the canvas center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub tl: Vec2,
    pub tr: Vec2,
    pub bl: Vec2,
    pub br: Vec2,
}

impl Quad {
    pub fn points(&self) -> [Vec2; 4] {
        [self.tl, self.tr, self.bl, self.br]
    }
}

/// One draw command: paint `tile` onto `quad`.
#[derive(Debug, Clone, Copy)]
pub struct DrawCommand<'a> {
    pub cell: (usize, usize),
    pub tile: &'a RgbaImage,
    pub quad: Quad,
}

/// A photo sphere bound to one source bitmap.
///
/// The vertex grid and mosaic are built once at construction and never
/// mutated; orientation and zoom are the only mutable state and are owned by
/// exactly one frame computation at a time.
#[derive(Debug, Clone)]
pub struct Sphere {
    config: SphereConfig,
    vertices: VertexGrid,
    rotated: RotatedGrid,
    mosaic: Mosaic,
    zoom: f32,
}

impl Sphere {
    pub fn new(bitmap: &RgbaImage, config: SphereConfig) -> Result<Self, SphereError> {
        let grid = GridConfig::new(config.grid.width, config.grid.height)?;
        let breaking = BreakingPoints::new(grid);
        let vertices = VertexGrid::build(grid, &breaking);
        let mosaic = Mosaic::build(bitmap, grid, &breaking)?;
        let rotated = RotatedGrid::new(
            &vertices,
            rotation::rotation_matrix(0.0, 0.0, config.frame_correction),
        );
        log::debug!(
            "bound {}x{} bitmap as {}x{} grid ({} tiles)",
            bitmap.width(),
            bitmap.height(),
            grid.width,
            grid.height,
            mosaic.len()
        );
        Ok(Self {
            config,
            vertices,
            rotated,
            mosaic,
            zoom: config.initial_zoom,
        })
    }

    pub fn config(&self) -> &SphereConfig {
        &self.config
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Stores a pre-clamped zoom factor; range policy lives in the viewer.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
    }

    /// Re-orients the sphere from a pair of drag angles. Replaces the
    /// previous orientation outright; successive calls never compound.
    pub fn rotate(&mut self, x_angle: f32, y_angle: f32) {
        self.set_rotation(rotation::rotation_matrix(
            x_angle,
            y_angle,
            self.config.frame_correction,
        ));
    }

    /// Re-orients the sphere from an externally supplied matrix (e.g. a
    /// sensor-fusion correction). Same replacement semantics as [`rotate`].
    ///
    /// [`rotate`]: Sphere::rotate
    pub fn set_rotation(&mut self, matrix: Mat3) {
        self.rotated = RotatedGrid::new(&self.vertices, matrix);
    }

    pub fn mosaic(&self) -> &Mosaic {
        &self.mosaic
    }

    pub fn rotated(&self) -> &RotatedGrid {
        &self.rotated
    }

    /// Emits one draw command per visible cell, row-major. Lazy and
    /// restartable: every call recomputes from the current orientation and
    /// zoom, nothing is memoized across frames. Cells failing the horizon
    /// test are skipped outright.
    pub fn draw_commands(
        &self,
        canvas: CanvasSize,
    ) -> impl Iterator<Item = DrawCommand<'_>> + '_ {
        let epsilon = self.config.horizon_epsilon;
        let zoom = self.zoom;
        let cols = self.config.grid.width;
        (0..self.config.grid.cell_rows()).flat_map(move |j| {
            (0..cols).filter_map(move |i| {
                if !projection::cell_visible(&self.rotated, i, j, epsilon) {
                    return None;
                }
                let quad = Quad {
                    tl: projection::project(self.rotated.get(i, j), canvas, zoom),
                    tr: projection::project(self.rotated.get(i + 1, j), canvas, zoom),
                    bl: projection::project(self.rotated.get(i, j + 1), canvas, zoom),
                    br: projection::project(self.rotated.get(i + 1, j + 1), canvas, zoom),
                };
                Some(DrawCommand {
                    cell: (i, j),
                    tile: self.mosaic.tile(i, j),
                    quad,
                })
            })
        })
    }
}
