//! Reference software rasterizer for the draw commands emitted by the
//! sphere core.
//!
//! The core only decides *what* tile goes on *which* quad; painting is a
//! collaborator concern behind [`TileRasterizer`]. The implementation here
//! splits each destination quad into two triangles, maps every covered
//! pixel back into the tile with the triangle's barycentric coordinates and
//! samples bilinearly.

use glam::Vec2;
use image::{Rgb, Rgba, RgbaImage};

use crate::projection::CanvasSize;
use crate::sphere::Quad;

/// Paints one tile image onto an arbitrary destination quadrilateral whose
/// corners are relative to the canvas center.
pub trait TileRasterizer {
    fn draw_tile(&mut self, tile: &RgbaImage, quad: &Quad);
}

/// CPU rasterizer over an owned RGBA canvas.
pub struct SoftwareRasterizer {
    canvas: RgbaImage,
}

impl SoftwareRasterizer {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, background),
        }
    }

    pub fn canvas_size(&self) -> CanvasSize {
        CanvasSize::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }
}

impl TileRasterizer for SoftwareRasterizer {
    fn draw_tile(&mut self, tile: &RgbaImage, quad: &Quad) {
        let center = self.canvas_size().center();
        let [tl, tr, bl, br] = quad.points().map(|p| p + center);

        let (tw, th) = tile.dimensions();
        let src_tl = Vec2::ZERO;
        let src_tr = Vec2::new(tw as f32, 0.0);
        let src_bl = Vec2::new(0.0, th as f32);
        let src_br = Vec2::new(tw as f32, th as f32);

        fill_triangle(&mut self.canvas, tile, [tl, tr, bl], [src_tl, src_tr, src_bl]);
        fill_triangle(&mut self.canvas, tile, [tr, br, bl], [src_tr, src_br, src_bl]);
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Fills one destination triangle, pulling texels from the matching source
/// triangle via barycentric interpolation.
fn fill_triangle(canvas: &mut RgbaImage, tile: &RgbaImage, dst: [Vec2; 3], src: [Vec2; 3]) {
    let area = edge(dst[0], dst[1], dst[2]);
    if area.abs() < 1e-6 {
        return;
    }

    let min_x = dst.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = dst.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = dst.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = dst.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }

    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.ceil() as u32).min(canvas.width().saturating_sub(1));
    let y1 = (max_y.ceil() as u32).min(canvas.height().saturating_sub(1));

    for py in y0..=y1 {
        for px in x0..=x1 {
            let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
            let w0 = edge(dst[1], dst[2], p) / area;
            let w1 = edge(dst[2], dst[0], p) / area;
            let w2 = edge(dst[0], dst[1], p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let uv = src[0] * w0 + src[1] * w1 + src[2] * w2;
            let rgb = sample_bilinear(tile, uv.x - 0.5, uv.y - 0.5);
            canvas.put_pixel(px, py, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        }
    }
}

fn lerp_px(a: Rgb<u8>, wa: f32, b: Rgb<u8>, wb: f32) -> Rgb<u8> {
    let mix = |x: u8, y: u8| (x as f32 * wa + y as f32 * wb) as u8;
    Rgb([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])])
}

fn sample_bilinear(img: &RgbaImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = img.dimensions();
    let x1 = (x.max(0.0) as u32).min(width - 1);
    let y1 = (y.max(0.0) as u32).min(height - 1);
    let x2 = (x1 + 1).min(width - 1);
    let y2 = (y1 + 1).min(height - 1);

    let rgb = |px: &Rgba<u8>| Rgb([px[0], px[1], px[2]]);
    let q11 = rgb(img.get_pixel(x1, y1));
    let q21 = rgb(img.get_pixel(x2, y1));
    let q12 = rgb(img.get_pixel(x1, y2));
    let q22 = rgb(img.get_pixel(x2, y2));

    let fx = (x - x1 as f32).clamp(0.0, 1.0);
    let fy = (y - y1 as f32).clamp(0.0, 1.0);
    let r1 = lerp_px(q11, 1.0 - fx, q21, fx);
    let r2 = lerp_px(q12, 1.0 - fx, q22, fx);
    lerp_px(r1, 1.0 - fy, r2, fy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paints_an_axis_aligned_quad() {
        let tile = RgbaImage::from_pixel(8, 8, Rgba([200, 10, 10, 255]));
        let mut raster = SoftwareRasterizer::new(40, 40, Rgba([0, 0, 0, 255]));
        // A 20x20 square centered on the canvas.
        let quad = Quad {
            tl: Vec2::new(-10.0, -10.0),
            tr: Vec2::new(10.0, -10.0),
            bl: Vec2::new(-10.0, 10.0),
            br: Vec2::new(10.0, 10.0),
        };
        raster.draw_tile(&tile, &quad);
        let out = raster.into_image();
        assert_eq!(*out.get_pixel(20, 20), Rgba([200, 10, 10, 255]));
        // Outside the quad the background survives.
        assert_eq!(*out.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn degenerate_quads_paint_nothing() {
        let tile = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let mut raster = SoftwareRasterizer::new(16, 16, Rgba([0, 0, 0, 255]));
        let p = Vec2::new(1.0, 1.0);
        let quad = Quad {
            tl: p,
            tr: p,
            bl: p,
            br: p,
        };
        raster.draw_tile(&tile, &quad);
        let out = raster.into_image();
        assert!(out.pixels().all(|px| *px == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn bilinear_sampling_blends_neighbours() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([100, 100, 100, 255]));
        let mid = sample_bilinear(&img, 0.5, 0.0);
        assert_eq!(mid, Rgb([50, 50, 50]));
    }
}
