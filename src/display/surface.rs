// src/display/surface.rs

//! Software pixel surface: a row-major RGBA buffer with clipped, alpha-
//! blended drawing primitives. All composition happens here; the device
//! encoding is applied only at present time.

use crate::color::Color;
use crate::geometry::{anchored_top_left, Point, Rect, Size};
use image::RgbaImage;

/// A CPU-side RGBA canvas, 4 bytes per pixel, row-major
/// (`idx = (y * width + x) * 4`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Creates a surface filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        Surface::filled(width, height, Color::BLACK)
    }

    /// Creates a surface filled with an opaque color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut surface = Surface {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        };
        surface.clear(color);
        surface
    }

    /// Wraps a decoded image, taking ownership of its pixels.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Surface {
            width,
            height,
            data: image.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Raw RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw pixels. Glyph images are the one producer of non-opaque
    /// pixels and need direct access; everything else goes through the
    /// drawing primitives.
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Fills the whole surface with an opaque color.
    pub fn clear(&mut self, color: Color) {
        for px in self.data.chunks_exact_mut(4) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = 0xFF;
        }
    }

    /// Flat opaque fill of `rect`, clipped to the surface.
    pub fn fill_rect(&mut self, color: Color, rect: Rect) {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = (rect.x + rect.width as i32).min(self.width as i32);
        let y1 = (rect.y + rect.height as i32).min(self.height as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                let idx = (y as usize * self.width as usize + x as usize) * 4;
                self.data[idx] = color.r;
                self.data[idx + 1] = color.g;
                self.data[idx + 2] = color.b;
                self.data[idx + 3] = 0xFF;
            }
        }
    }

    /// Alpha-blends one source pixel onto `(x, y)`. Out-of-bounds writes are
    /// discarded.
    fn blend_pixel(&mut self, x: i32, y: i32, color: Color, alpha: u8) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let a = alpha as u32;
        let inv = 255 - a;
        self.data[idx] = ((color.r as u32 * a + self.data[idx] as u32 * inv) / 255) as u8;
        self.data[idx + 1] = ((color.g as u32 * a + self.data[idx + 1] as u32 * inv) / 255) as u8;
        self.data[idx + 2] = ((color.b as u32 * a + self.data[idx + 2] as u32 * inv) / 255) as u8;
        self.data[idx + 3] = 0xFF;
    }

    /// Blits `src` with its top-left corner at `top_left`, alpha-blending
    /// and clipping against the surface bounds.
    pub fn blit(&mut self, src: &Surface, top_left: Point) {
        for sy in 0..src.height {
            let dy = top_left.y + sy as i32;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            for sx in 0..src.width {
                let dx = top_left.x + sx as i32;
                let sidx = (sy as usize * src.width as usize + sx as usize) * 4;
                let color = Color::new(src.data[sidx], src.data[sidx + 1], src.data[sidx + 2]);
                self.blend_pixel(dx, dy, color, src.data[sidx + 3]);
            }
        }
    }

    /// Blits `src` centered on `anchor`.
    pub fn blit_centered(&mut self, src: &Surface, anchor: Point) {
        self.blit(src, anchored_top_left(anchor, src.size()));
    }

    /// Blends a coverage bitmap (one byte per pixel) as `color`, with the
    /// bitmap's top-left at `top_left`.
    pub fn blend_coverage(
        &mut self,
        coverage: &[u8],
        width: u32,
        height: u32,
        color: Color,
        top_left: Point,
    ) {
        for cy in 0..height {
            for cx in 0..width {
                let alpha = coverage[(cy * width + cx) as usize];
                if alpha > 0 {
                    self.blend_pixel(top_left.x + cx as i32, top_left.y + cy as i32, color, alpha);
                }
            }
        }
    }

    /// Reads back one pixel as an RGB color. Test and diagnostic aid.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        Color::new(self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_surface_is_opaque_black() {
        let surface = Surface::new(4, 4);
        assert_eq!(surface.pixel(0, 0), Color::BLACK);
        assert_eq!(surface.data().len(), 4 * 4 * 4);
        assert_eq!(surface.data()[3], 0xFF);
    }

    #[test]
    fn fill_rect_is_clipped_to_bounds() {
        let mut surface = Surface::new(8, 8);
        surface.fill_rect(Color::WHITE, Rect::new(6, 6, 10, 10));
        assert_eq!(surface.pixel(7, 7), Color::WHITE);
        assert_eq!(surface.pixel(5, 5), Color::BLACK);
    }

    #[test]
    fn fill_rect_with_negative_origin_is_clipped() {
        let mut surface = Surface::new(8, 8);
        surface.fill_rect(Color::WHITE, Rect::new(-4, -4, 6, 6));
        assert_eq!(surface.pixel(0, 0), Color::WHITE);
        assert_eq!(surface.pixel(1, 1), Color::WHITE);
        assert_eq!(surface.pixel(2, 2), Color::BLACK);
    }

    #[test]
    fn centered_blit_places_top_left_at_anchor_minus_half() {
        let mut dst = Surface::new(20, 20);
        let src = Surface::filled(4, 2, Color::WHITE);
        dst.blit_centered(&src, Point::new(10, 10));
        // Top-left must be (10 - 2, 10 - 1).
        assert_eq!(dst.pixel(8, 9), Color::WHITE);
        assert_eq!(dst.pixel(11, 10), Color::WHITE);
        assert_eq!(dst.pixel(7, 9), Color::BLACK);
        assert_eq!(dst.pixel(8, 8), Color::BLACK);
    }

    #[test]
    fn partially_offscreen_blit_does_not_panic() {
        let mut dst = Surface::new(10, 10);
        let src = Surface::filled(6, 6, Color::WHITE);
        dst.blit(&src, Point::new(-3, -3));
        dst.blit(&src, Point::new(8, 8));
        assert_eq!(dst.pixel(0, 0), Color::WHITE);
        assert_eq!(dst.pixel(9, 9), Color::WHITE);
        assert_eq!(dst.pixel(5, 5), Color::BLACK);
    }

    #[test]
    fn blend_half_alpha_mixes_channels() {
        let mut surface = Surface::new(1, 1);
        surface.blend_pixel(0, 0, Color::WHITE, 128);
        let px = surface.pixel(0, 0);
        assert!(px.r >= 127 && px.r <= 129, "got {}", px.r);
    }
}
