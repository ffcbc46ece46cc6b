// src/views/progress.rs

//! The progress view: the now-playing layout plus a progress bar flanked by
//! elapsed and remaining time, at twice the poll cadence. The time readouts
//! use the opaque text backdrop so they stay legible over artwork.

use crate::artwork::fetch_artwork;
use crate::color::Color;
use crate::display::Display;
use crate::geometry::{mmss, remap, Point, Rect, Size};
use crate::playback::PlaybackSource;
use crate::render_loop::FrameSource;
use crate::views::{ARTISTS_OFFSET, ARTISTS_PX, TITLE_PX, UI_FONT};
use reqwest::blocking::Client;

/// Width of the progress-bar track in pixels.
pub const BAR_WIDTH: u32 = 300;
/// Height of the bar in pixels.
pub const BAR_HEIGHT: u32 = 6;
/// Vertical offset of the bar below the render center.
pub const BAR_OFFSET: i32 = 120;
/// Time readout size in pixels.
pub const TIME_PX: f32 = 24.0;
/// Horizontal gap between the bar's ends and the time readout anchors.
const TIME_GAP: i32 = 30;

const TRACK_COLOR: Color = Color::new(60, 60, 60);

/// Filled width of the bar for a given playhead position.
pub fn filled_width(progress_ms: u32, duration_ms: u32, track_width: u32) -> u32 {
    remap(
        progress_ms as i64,
        0,
        duration_ms as i64,
        0,
        track_width as i64,
    ) as u32
}

pub struct ProgressView {
    source: Box<dyn PlaybackSource>,
    http: Client,
}

impl ProgressView {
    pub fn new(source: Box<dyn PlaybackSource>) -> Self {
        ProgressView {
            source,
            http: Client::new(),
        }
    }
}

impl FrameSource for ProgressView {
    fn target_fps(&self) -> f64 {
        2.0
    }

    fn produce_frame(&mut self, display: &mut Display, center: Point) -> anyhow::Result<()> {
        display.clear(Color::BLACK);

        let Some(snapshot) = self.source.poll()? else {
            return Ok(());
        };

        let art = fetch_artwork(&self.http, &snapshot.artwork_url)?;
        display.show_image(
            &art,
            center,
            Size::new(snapshot.artwork_width, snapshot.artwork_height),
        );

        display.show_text(
            &snapshot.track_name,
            UI_FONT,
            TITLE_PX,
            Color::WHITE,
            center,
            None,
        )?;
        let artists = snapshot.artist_names.join(", ");
        display.show_text(
            &artists,
            UI_FONT,
            ARTISTS_PX,
            Color::WHITE,
            center.offset(0, ARTISTS_OFFSET),
            None,
        )?;

        // Bar track, then fill from the left edge.
        let bar_y = center.y + BAR_OFFSET;
        let bar_x = center.x - BAR_WIDTH as i32 / 2;
        let bar_top = bar_y - BAR_HEIGHT as i32 / 2;
        display.fill_rect(
            TRACK_COLOR,
            Rect::new(bar_x, bar_top, BAR_WIDTH, BAR_HEIGHT),
        );
        let fill = filled_width(snapshot.progress_ms, snapshot.duration_ms, BAR_WIDTH);
        display.fill_rect(Color::WHITE, Rect::new(bar_x, bar_top, fill, BAR_HEIGHT));

        let elapsed_secs = snapshot.progress_ms / 1000;
        let remaining_secs = (snapshot.duration_ms - snapshot.progress_ms) / 1000;
        display.show_text(
            &mmss(elapsed_secs),
            UI_FONT,
            TIME_PX,
            Color::WHITE,
            Point::new(bar_x - TIME_GAP, bar_y),
            Some(Color::BLACK),
        )?;
        display.show_text(
            &mmss(remaining_secs),
            UI_FONT,
            TIME_PX,
            Color::WHITE,
            Point::new(bar_x + BAR_WIDTH as i32 + TIME_GAP, bar_y),
            Some(Color::BLACK),
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_progress_fills_a_quarter_of_the_track() {
        assert_eq!(filled_width(30_000, 120_000, 300), 75);
    }

    #[test]
    fn fill_covers_the_endpoints() {
        assert_eq!(filled_width(0, 120_000, 300), 0);
        assert_eq!(filled_width(120_000, 120_000, 300), 300);
    }
}
