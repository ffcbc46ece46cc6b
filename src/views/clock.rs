// src/views/clock.rs

//! The clock/test-pattern view: wall-clock time over an HSV hue ring traced
//! around the circular bezel, with an optional test image underneath. No
//! network; runs at 30 Hz.

use crate::color::{hsv_to_rgb, Color};
use crate::display::Display;
use crate::geometry::{Point, Rect, Size};
use crate::render_loop::FrameSource;
use crate::views::{TITLE_PX, UI_FONT};
use chrono::Local;
use image::RgbaImage;
use log::debug;
use std::f32::consts::TAU;
use std::path::Path;

/// Radius of the hue ring, just inside the 480px bezel.
const RING_RADIUS: f32 = 230.0;
/// Dots drawn around the ring.
const RING_STEPS: u32 = 360;
/// Side of each square ring dot.
const DOT_SIZE: u32 = 6;

pub struct ClockView {
    test_image: Option<RgbaImage>,
}

impl ClockView {
    /// Loads the test image if the file exists; a missing or undecodable
    /// file is tolerated and the ring draws over plain black.
    pub fn new(test_image: &Path) -> Self {
        let loaded = match image::open(test_image) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                debug!("No test image at {}: {}", test_image.display(), e);
                None
            }
        };
        ClockView { test_image: loaded }
    }
}

impl FrameSource for ClockView {
    fn target_fps(&self) -> f64 {
        30.0
    }

    fn produce_frame(&mut self, display: &mut Display, center: Point) -> anyhow::Result<()> {
        display.clear(Color::BLACK);

        if let Some(img) = &self.test_image {
            let (w, h) = img.dimensions();
            display.show_image(img, center, Size::new(w, h));
        }

        for step in 0..RING_STEPS {
            let hue = step as f32 / RING_STEPS as f32;
            let theta = hue * TAU;
            let x = center.x + (theta.cos() * RING_RADIUS).round() as i32;
            let y = center.y + (theta.sin() * RING_RADIUS).round() as i32;
            display.fill_rect(
                hsv_to_rgb(hue, 1.0, 1.0),
                Rect::new(
                    x - DOT_SIZE as i32 / 2,
                    y - DOT_SIZE as i32 / 2,
                    DOT_SIZE,
                    DOT_SIZE,
                ),
            );
        }

        let time = Local::now().format("%H:%M:%S").to_string();
        display.show_text(&time, UI_FONT, TITLE_PX, Color::WHITE, center, None)?;

        Ok(())
    }
}
