//! Rotation matrix composition and application to the vertex grid.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat3, Vec3};

use crate::grid::VertexGrid;

/// Fixed reference-frame correction applied after the two view angles, so
/// that angles (0,0) present the front of the undistorted bitmap to the
/// viewer. Empirical constant; changing it changes what "front" means.
pub const FRAME_CORRECTION: f32 = -FRAC_PI_2;

/// Composes the view rotation for a pair of drag angles.
///
/// The sphere is spun by `x_angle` about the polar axis, tilted by
/// `y_angle`, then rolled by the fixed correction about the depth axis.
/// Order matters: the factors do not commute, and this exact composition is
/// what lines the rotated grid up with the parameterization of
/// [`VertexGrid::build`]. Angle signs follow the drag conventions of the
/// touch handler.
pub fn rotation_matrix(x_angle: f32, y_angle: f32, correction: f32) -> Mat3 {
    Mat3::from_rotation_z(-correction)
        * Mat3::from_rotation_y(y_angle)
        * Mat3::from_rotation_x(-x_angle)
}

/// The vertex grid under the current orientation.
///
/// Derived state with "latest write wins" semantics: every orientation
/// change recomputes it wholesale from the base grid, so rotations never
/// compound.
#[derive(Debug, Clone)]
pub struct RotatedGrid {
    width: usize,
    height: usize,
    verts: Vec<Vec3>,
}

impl RotatedGrid {
    pub fn new(base: &VertexGrid, matrix: Mat3) -> Self {
        let mut verts = Vec::with_capacity(base.width() * base.height());
        for j in 0..base.height() {
            for i in 0..base.width() {
                verts.push(matrix * base.get(i, j));
            }
        }
        Self {
            width: base.width(),
            height: base.height(),
            verts,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Column index wraps like [`VertexGrid::get`].
    pub fn get(&self, i: usize, j: usize) -> Vec3 {
        self.verts[j * self.width + i % self.width]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BreakingPoints, GridConfig};
    use approx::assert_relative_eq;

    fn base() -> VertexGrid {
        let g = GridConfig::new(6, 4).unwrap();
        VertexGrid::build(g, &BreakingPoints::new(g))
    }

    #[test]
    fn identity_angles_reduce_to_the_frame_correction() {
        // At angles (0,0) only the correction roll remains; it maps
        // (x, y, z) to (-y, x, z) and leaves depth untouched.
        let m = rotation_matrix(0.0, 0.0, FRAME_CORRECTION);
        let v = m * glam::Vec3::new(0.3, 0.7, -0.2);
        assert_relative_eq!(v.x, -0.7, epsilon = 1e-6);
        assert_relative_eq!(v.y, 0.3, epsilon = 1e-6);
        assert_relative_eq!(v.z, -0.2, epsilon = 1e-6);
    }

    #[test]
    fn rotation_is_not_cumulative() {
        let grid = base();
        let once = RotatedGrid::new(&grid, rotation_matrix(0.8, -0.3, FRAME_CORRECTION));
        // Rotating to some other orientation first must not leave a trace.
        let _detour = RotatedGrid::new(&grid, rotation_matrix(2.1, 1.0, FRAME_CORRECTION));
        let again = RotatedGrid::new(&grid, rotation_matrix(0.8, -0.3, FRAME_CORRECTION));
        for j in 0..grid.height() {
            for i in 0..grid.width() {
                assert_relative_eq!(
                    once.get(i, j).distance(again.get(i, j)),
                    0.0,
                    epsilon = 1e-6
                );
            }
        }
    }

    #[test]
    fn rotation_preserves_norms() {
        let grid = base();
        let rotated = RotatedGrid::new(&grid, rotation_matrix(1.2, 0.4, FRAME_CORRECTION));
        for j in 0..grid.height() {
            for i in 0..grid.width() {
                assert_relative_eq!(rotated.get(i, j).length(), 1.0, epsilon = 1e-4);
            }
        }
    }
}
