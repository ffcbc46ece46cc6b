// src/display/mod.rs

//! The display facade: one composited surface per process and the single
//! point where windowed-flip vs. raw-framebuffer behavior is hidden from
//! callers.

pub mod backend;
pub mod surface;
pub mod text;

use crate::color::{encode_rgb565_le, Color};
use crate::geometry::{Point, Rect, Size};
use anyhow::Context;
use image::imageops::FilterType;
use image::RgbaImage;
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use backend::{DisplayMode, Selection};
use surface::Surface;
use text::FontStore;

/// The process's one display: the composition surface, its output mode, and
/// the font cache the text primitive draws from.
///
/// Created once after backend selection, released exactly once on shutdown.
pub struct Display {
    surface: Surface,
    mode: DisplayMode,
    /// Flip target for windowed mode; `None` in raw mode, where each
    /// present opens the framebuffer device fresh.
    device: Option<File>,
    fb_path: PathBuf,
    fonts: FontStore,
    encode_buf: Vec<u8>,
    released: bool,
    release_count: u32,
}

impl Display {
    /// Builds the display for a completed backend selection. In windowed
    /// mode the winning driver's device node is opened now and held for the
    /// process lifetime.
    pub fn new(selection: &Selection, fonts: FontStore, fb_path: PathBuf) -> anyhow::Result<Self> {
        let device = match (selection.mode, selection.driver) {
            (DisplayMode::Windowed, Some(kind)) => {
                let node = kind.device_node();
                let file = OpenOptions::new()
                    .write(true)
                    .open(node)
                    .with_context(|| format!("opening {} for presentation", node))?;
                Some(file)
            }
            _ => None,
        };
        info!(
            "Display ready: {}x{}, mode {:?}",
            selection.width, selection.height, selection.mode
        );
        Ok(Display {
            surface: Surface::new(selection.width, selection.height),
            mode: selection.mode,
            device,
            fb_path,
            fonts,
            encode_buf: Vec::new(),
            released: false,
            release_count: 0,
        })
    }

    /// Builds a raw-mode display directly. Pure in-memory allocation; used
    /// by the fallback path and by tests pointed at a scratch file.
    pub fn new_raw(width: u32, height: u32, fonts: FontStore, fb_path: PathBuf) -> Self {
        Display {
            surface: Surface::new(width, height),
            mode: DisplayMode::RawFramebuffer,
            device: None,
            fb_path,
            fonts,
            encode_buf: Vec::new(),
            released: false,
            release_count: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Fills the whole frame with an opaque color.
    pub fn clear(&mut self, color: Color) {
        self.surface.clear(color);
    }

    /// Flat fill, clipped to the frame.
    pub fn fill_rect(&mut self, color: Color, rect: Rect) {
        self.surface.fill_rect(color, rect);
    }

    /// Scales `image` to `target` and blits it centered on `anchor`.
    pub fn show_image(&mut self, image: &RgbaImage, anchor: Point, target: Size) {
        let scaled = if image.dimensions() == (target.width, target.height) {
            Surface::from_rgba_image(image.clone())
        } else {
            Surface::from_rgba_image(image::imageops::resize(
                image,
                target.width.max(1),
                target.height.max(1),
                FilterType::Triangle,
            ))
        };
        self.surface.blit_centered(&scaled, anchor);
    }

    /// Rasterizes `text` in the named font and blits it centered on
    /// `anchor`. With `bg` set the glyphs sit on an opaque padded backdrop.
    pub fn show_text(
        &mut self,
        content: &str,
        font_name: &str,
        px: f32,
        fg: Color,
        anchor: Point,
        bg: Option<Color>,
    ) -> anyhow::Result<()> {
        let font = self.fonts.get(font_name)?;
        let rendered = text::render_text(font, content, px, fg, bg);
        self.surface.blit_centered(&rendered, anchor);
        Ok(())
    }

    /// Pushes the composed frame to the screen: a device-file write of the
    /// RGB565 serialization in raw mode, a flip of the held surface in
    /// windowed mode.
    pub fn present(&mut self) -> anyhow::Result<()> {
        encode_rgb565_le(self.surface.data(), &mut self.encode_buf);
        match self.device.as_mut() {
            Some(device) => {
                device
                    .seek(SeekFrom::Start(0))
                    .context("rewinding display device")?;
                device
                    .write_all(&self.encode_buf)
                    .context("flipping frame to display device")?;
                device.flush().context("flushing display device")?;
            }
            None => {
                // The device wants the whole frame in one write.
                std::fs::write(&self.fb_path, &self.encode_buf)
                    .with_context(|| format!("writing frame to {}", self.fb_path.display()))?;
            }
        }
        Ok(())
    }

    /// Releases the backend surface. Idempotent: only the first call drops
    /// the device handle.
    pub fn release(&mut self) {
        if self.released {
            debug!("Display already released; ignoring");
            return;
        }
        self.released = true;
        self.release_count += 1;
        self.device = None;
        info!("Display released");
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    #[cfg(test)]
    pub(crate) fn release_count(&self) -> u32 {
        self.release_count
    }

    #[cfg(test)]
    pub(crate) fn surface(&self) -> &Surface {
        &self.surface
    }

    #[cfg(test)]
    pub(crate) fn fb_path(&self) -> &std::path::Path {
        &self.fb_path
    }
}
