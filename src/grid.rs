//! Latitude/longitude breaking points and the unit-sphere vertex grid.

use glam::Vec3;

use crate::SphereError;

/// Offset keeping the vertical breaking points off the exact poles, where
/// tiles would otherwise degenerate to zero height.
const POLE_MARGIN: f32 = 0.0005;
const VERTICAL_SPAN: f32 = 0.999;

/// Grid dimensions, fixed for the lifetime of a sphere instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

impl GridConfig {
    pub fn new(width: usize, height: usize) -> Result<Self, SphereError> {
        if width < 2 || height < 2 {
            return Err(SphereError::GridTooSmall { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of mosaic cells: a cell spans two adjacent vertex rows, so
    /// there is one less row of cells than of vertices.
    pub fn cell_rows(&self) -> usize {
        self.height - 1
    }
}

/// Fractions of the source bitmap at which it is sliced into tiles, and at
/// which the matching vertices are placed on the sphere.
///
/// `horizontal` has `width + 1` entries (`i / width`, so the last one closes
/// the seam at 1.0); `vertical` has `height` entries, squeezed slightly away
/// from the poles.
#[derive(Debug, Clone)]
pub struct BreakingPoints {
    pub horizontal: Vec<f32>,
    pub vertical: Vec<f32>,
}

impl BreakingPoints {
    pub fn new(grid: GridConfig) -> Self {
        let horizontal = (0..=grid.width)
            .map(|i| i as f32 / grid.width as f32)
            .collect();
        let vertical = (0..grid.height)
            .map(|j| POLE_MARGIN + j as f32 * VERTICAL_SPAN / (grid.height - 1) as f32)
            .collect();
        Self {
            horizontal,
            vertical,
        }
    }
}

/// The undistorted sphere sampling, one unit vector per breaking-point pair.
///
/// Laid out like meridians and parallels of a globe rather than a regular
/// polyhedron, so the cells line up 1:1 with the mosaic tiles cut from the
/// equirectangular bitmap. Built once and never mutated.
#[derive(Debug, Clone)]
pub struct VertexGrid {
    width: usize,
    height: usize,
    verts: Vec<Vec3>,
}

impl VertexGrid {
    pub fn build(grid: GridConfig, breaking: &BreakingPoints) -> Self {
        let mut verts = Vec::with_capacity(grid.width * grid.height);
        for j in 0..grid.height {
            for i in 0..grid.width {
                let x_angle = 2.0 * std::f32::consts::PI * breaking.horizontal[i];
                let y_angle = std::f32::consts::PI * (breaking.vertical[j] - 0.5);
                verts.push(Vec3::new(
                    y_angle.sin(),
                    x_angle.cos() * y_angle.cos(),
                    x_angle.sin() * y_angle.cos(),
                ));
            }
        }
        Self {
            width: grid.width,
            height: grid.height,
            verts,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Fetches the vertex at column `i`, row `j`. The column index wraps, so
    /// a cell's right edge is addressed as `i + 1` even in the last column
    /// (the seam at longitude 2π meets longitude 0).
    pub fn get(&self, i: usize, j: usize) -> Vec3 {
        self.verts[j * self.width + i % self.width]
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.verts.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(w: usize, h: usize) -> GridConfig {
        GridConfig::new(w, h).unwrap()
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        assert_eq!(
            GridConfig::new(1, 30),
            Err(SphereError::GridTooSmall {
                width: 1,
                height: 30
            })
        );
        assert!(GridConfig::new(2, 2).is_ok());
    }

    #[test]
    fn breaking_points_are_strictly_increasing() {
        let bp = BreakingPoints::new(grid(30, 30));
        assert_eq!(bp.horizontal.len(), 31);
        assert_eq!(bp.vertical.len(), 30);
        for w in bp.horizontal.windows(2).chain(bp.vertical.windows(2)) {
            assert!(w[0] < w[1]);
        }
        assert_relative_eq!(bp.horizontal[0], 0.0);
        assert_relative_eq!(bp.horizontal[30], 1.0);
        assert!(bp.vertical[0] > 0.0);
        assert!(bp.vertical[29] < 1.0);
    }

    #[test]
    fn vertices_have_unit_norm() {
        for (w, h) in [(2, 2), (4, 7), (30, 30)] {
            let g = grid(w, h);
            let verts = VertexGrid::build(g, &BreakingPoints::new(g));
            for v in verts.iter() {
                assert_relative_eq!(v.length(), 1.0, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn column_index_wraps_at_the_seam() {
        let g = grid(8, 4);
        let verts = VertexGrid::build(g, &BreakingPoints::new(g));
        for j in 0..4 {
            assert_eq!(verts.get(8, j), verts.get(0, j));
        }
    }
}
