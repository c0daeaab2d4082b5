//! Renders an equirectangular ("photo sphere") bitmap as a rotatable,
//! zoomable globe on a 2D canvas.
//!
//! The pipeline per frame is one-way: rotation state -> rotated vertex grid
//! -> visibility test -> projected quads -> draw commands. The mosaic of
//! bitmap tiles is built once per bound bitmap and is immutable afterwards.
//! Actual pixel blitting is delegated to a [`TileRasterizer`]; a software
//! reference implementation lives in [`renderer`].

pub mod grid;
pub mod mosaic;
pub mod projection;
pub mod renderer;
pub mod rotation;
pub mod sphere;
pub mod viewer;

pub use grid::{BreakingPoints, GridConfig, VertexGrid};
pub use mosaic::Mosaic;
pub use projection::{CanvasSize, INITIAL_ZOOM, MAX_ZOOM, MIN_ZOOM};
pub use renderer::{SoftwareRasterizer, TileRasterizer};
pub use rotation::RotatedGrid;
pub use sphere::{DrawCommand, Quad, Sphere, SphereConfig};
pub use viewer::{SphereViewer, ViewerMode};

/// Errors surfaced by the sphere core.
///
/// Configuration errors (`GridTooSmall`, `EmptyBitmap`, `DegenerateTile`)
/// fail fast at bind time; `NotBound` flags the programming error of
/// rendering before any bitmap has been bound.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SphereError {
    #[error("grid must be at least 2x2, got {width}x{height}")]
    GridTooSmall { width: usize, height: usize },

    #[error("source bitmap is empty ({width}x{height})")]
    EmptyBitmap { width: u32, height: u32 },

    #[error("mosaic tile ({col},{row}) maps to an empty pixel rect in a {width}x{height} bitmap")]
    DegenerateTile {
        col: usize,
        row: usize,
        width: u32,
        height: u32,
    },

    #[error("no bitmap bound, call bind() before rendering")]
    NotBound,
}
