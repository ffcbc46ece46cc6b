// src/display/text.rs

//! CPU text rasterization via `fontdue`, plus the named-font cache.
//!
//! Text is rendered into its own small `Surface` and then composited with
//! the anchor-centered blit, so callers never see glyph metrics. With a
//! background color the glyph image is laid over an opaque padded backdrop
//! first, keeping time readouts legible over artwork.

use crate::color::Color;
use crate::display::surface::Surface;
use crate::geometry::Point;
use anyhow::{anyhow, Context};
use fontdue::{Font, FontSettings};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Margin added on each side of the glyph image when a backdrop is drawn.
pub const BACKDROP_PAD: u32 = 4;

/// Loads fonts by file name from a configured directory, parsing each at
/// most once per process.
pub struct FontStore {
    dir: PathBuf,
    fonts: HashMap<String, Font>,
}

impl FontStore {
    pub fn new(dir: PathBuf) -> Self {
        FontStore {
            dir,
            fonts: HashMap::new(),
        }
    }

    /// Returns the named font, loading and caching it on first use.
    pub fn get(&mut self, name: &str) -> anyhow::Result<&Font> {
        match self.fonts.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = self.dir.join(name);
                let bytes = fs::read(&path)
                    .with_context(|| format!("reading font {}", path.display()))?;
                let font = Font::from_bytes(bytes, FontSettings::default())
                    .map_err(|e| anyhow!("parsing font {}: {}", path.display(), e))?;
                Ok(entry.insert(font))
            }
        }
    }
}

/// A single-line coverage bitmap, one byte per pixel.
struct CoverageLine {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

/// Rasterizes one line of text into a coverage bitmap at `px` pixels.
fn rasterize_line(font: &Font, text: &str, px: f32) -> CoverageLine {
    // Vertical-only fonts report no horizontal metrics; fall back to the
    // nominal size.
    let (ascent, height) = match font.horizontal_line_metrics(px) {
        Some(m) => (m.ascent.ceil(), (m.ascent - m.descent).ceil().max(1.0) as u32),
        None => (px.ceil(), px.ceil().max(1.0) as u32),
    };

    let width = text
        .chars()
        .map(|ch| font.metrics(ch, px).advance_width)
        .sum::<f32>()
        .ceil()
        .max(1.0) as u32;

    let mut data = vec![0u8; (width * height) as usize];
    let mut pen_x = 0.0f32;
    for ch in text.chars() {
        let (metrics, bitmap) = font.rasterize(ch, px);
        let x0 = pen_x.round() as i32 + metrics.xmin;
        let y0 = ascent as i32 - metrics.height as i32 - metrics.ymin;
        for (row, chunk) in bitmap.chunks_exact(metrics.width.max(1)).enumerate() {
            let y = y0 + row as i32;
            if y < 0 || y >= height as i32 {
                continue;
            }
            for (col, &coverage) in chunk.iter().enumerate() {
                let x = x0 + col as i32;
                if x < 0 || x >= width as i32 {
                    continue;
                }
                let idx = (y as u32 * width + x as u32) as usize;
                data[idx] = data[idx].max(coverage);
            }
        }
        pen_x += metrics.advance_width;
    }

    CoverageLine {
        data,
        width,
        height,
    }
}

/// Renders `text` to a surface ready for centered blitting.
///
/// Without a background the result is the glyph image itself: foreground
/// color with per-pixel coverage as alpha. With one, the glyphs are
/// composited onto an opaque backdrop padded `BACKDROP_PAD` on each side.
pub fn render_text(font: &Font, text: &str, px: f32, fg: Color, bg: Option<Color>) -> Surface {
    compose(&rasterize_line(font, text, px), fg, bg)
}

/// Turns a coverage line into a blittable surface, with or without the
/// opaque backdrop.
fn compose(line: &CoverageLine, fg: Color, bg: Option<Color>) -> Surface {
    match bg {
        Some(bg) => {
            let mut surface = Surface::filled(
                line.width + 2 * BACKDROP_PAD,
                line.height + 2 * BACKDROP_PAD,
                bg,
            );
            surface.blend_coverage(
                &line.data,
                line.width,
                line.height,
                fg,
                Point::new(BACKDROP_PAD as i32, BACKDROP_PAD as i32),
            );
            surface
        }
        None => {
            let mut surface = Surface::new(line.width, line.height);
            let data = surface.data_mut();
            for (px_idx, &coverage) in line.data.iter().enumerate() {
                data[px_idx * 4] = fg.r;
                data[px_idx * 4 + 1] = fg.g;
                data[px_idx * 4 + 2] = fg.b;
                data[px_idx * 4 + 3] = coverage;
            }
            surface
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_line(width: u32, height: u32) -> CoverageLine {
        CoverageLine {
            data: vec![255; (width * height) as usize],
            width,
            height,
        }
    }

    #[test]
    fn bare_glyph_image_matches_line_dimensions() {
        let surface = compose(&solid_line(10, 6), Color::WHITE, None);
        assert_eq!(surface.width(), 10);
        assert_eq!(surface.height(), 6);
        assert_eq!(surface.pixel(0, 0), Color::WHITE);
        // Full coverage is fully opaque.
        assert_eq!(surface.data()[3], 255);
    }

    #[test]
    fn backdrop_pads_four_pixels_each_side() {
        let surface = compose(&solid_line(10, 6), Color::WHITE, Some(Color::BLACK));
        assert_eq!(surface.width(), 10 + 2 * BACKDROP_PAD);
        assert_eq!(surface.height(), 6 + 2 * BACKDROP_PAD);
        // Margin stays backdrop-colored; glyph area takes the foreground.
        assert_eq!(surface.pixel(0, 0), Color::BLACK);
        assert_eq!(surface.pixel(BACKDROP_PAD, BACKDROP_PAD), Color::WHITE);
    }

    #[test]
    fn zero_coverage_leaves_glyph_image_transparent() {
        let line = CoverageLine {
            data: vec![0; 12],
            width: 4,
            height: 3,
        };
        let surface = compose(&line, Color::WHITE, None);
        assert_eq!(surface.data()[3], 0);
    }
}
