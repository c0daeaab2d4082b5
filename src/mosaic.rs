//! Slices the source bitmap into the tile mosaic bound to the vertex grid.

use image::RgbaImage;

use crate::grid::{BreakingPoints, GridConfig};
use crate::SphereError;

/// A `width x (height - 1)` grid of bitmap tiles, each covering the source
/// rectangle between consecutive breaking points.
///
/// Tiles are copies, not views: the source bitmap may be dropped right after
/// construction. Built once per bound bitmap, immutable afterwards.
#[derive(Debug, Clone)]
pub struct Mosaic {
    cols: usize,
    rows: usize,
    tiles: Vec<RgbaImage>,
}

impl Mosaic {
    pub fn build(
        bitmap: &RgbaImage,
        grid: GridConfig,
        breaking: &BreakingPoints,
    ) -> Result<Self, SphereError> {
        let (bmp_w, bmp_h) = bitmap.dimensions();
        if bmp_w == 0 || bmp_h == 0 {
            return Err(SphereError::EmptyBitmap {
                width: bmp_w,
                height: bmp_h,
            });
        }

        let cols = grid.width;
        let rows = grid.cell_rows();
        let mut tiles = Vec::with_capacity(cols * rows);
        for j in 0..rows {
            for i in 0..cols {
                let x0 = (bmp_w as f32 * breaking.horizontal[i]) as u32;
                let y0 = (bmp_h as f32 * breaking.vertical[j]) as u32;
                let w = (bmp_w as f32 * (breaking.horizontal[i + 1] - breaking.horizontal[i]))
                    as u32;
                let h =
                    (bmp_h as f32 * (breaking.vertical[j + 1] - breaking.vertical[j])) as u32;
                if w == 0 || h == 0 || x0 + w > bmp_w || y0 + h > bmp_h {
                    return Err(SphereError::DegenerateTile {
                        col: i,
                        row: j,
                        width: bmp_w,
                        height: bmp_h,
                    });
                }
                tiles.push(image::imageops::crop_imm(bitmap, x0, y0, w, h).to_image());
            }
        }

        Ok(Self { cols, rows, tiles })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, i: usize, j: usize) -> &RgbaImage {
        &self.tiles[j * self.cols + i]
    }
}
