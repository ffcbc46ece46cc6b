// src/color.rs

//! RGB color values, HSV conversion for the clock view's hue ring, and the
//! 16-bit RGB565 encoding the framebuffer device expects.

use serde::{Deserialize, Serialize};

/// An opaque RGB color. Alpha only exists transiently inside the renderer
/// (glyph coverage, decoded artwork); everything configured or laid out in
/// the application is a plain RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Packs this color into RGB565: 5 bits red, 6 bits green, 5 bits blue.
    pub fn to_rgb565(self) -> u16 {
        ((self.r as u16 & 0xF8) << 8) | ((self.g as u16 & 0xFC) << 3) | (self.b as u16 >> 3)
    }
}

/// Converts HSV to RGB. All inputs are in `0.0..=1.0`; `h` wraps.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Color {
    let h = (h.rem_euclid(1.0)) * 6.0;
    let sector = h.floor() as u32 % 6;
    let f = h - h.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Color::new(
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

/// Serializes a row-major RGBA buffer into little-endian RGB565, the
/// device's native pixel encoding. `out` is replaced (2 bytes per pixel,
/// reusing its allocation across frames); alpha is dropped.
pub fn encode_rgb565_le(rgba: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(rgba.len() / 2);
    for px in rgba.chunks_exact(4) {
        let packed = Color::new(px[0], px[1], px[2]).to_rgb565();
        out.extend_from_slice(&packed.to_le_bytes());
    }
}
