// src/views/now_playing.rs

//! The primary view: album art centered on the panel with the track title
//! over it and the artist line below. Polls and re-fetches once per second.

use crate::artwork::fetch_artwork;
use crate::color::Color;
use crate::display::Display;
use crate::geometry::{Point, Size};
use crate::playback::PlaybackSource;
use crate::render_loop::FrameSource;
use crate::views::{ARTISTS_OFFSET, ARTISTS_PX, TITLE_PX, UI_FONT};
use reqwest::blocking::Client;

pub struct NowPlayingView {
    source: Box<dyn PlaybackSource>,
    http: Client,
}

impl NowPlayingView {
    pub fn new(source: Box<dyn PlaybackSource>) -> Self {
        NowPlayingView {
            source,
            http: Client::new(),
        }
    }
}

impl FrameSource for NowPlayingView {
    fn target_fps(&self) -> f64 {
        1.0
    }

    fn produce_frame(&mut self, display: &mut Display, center: Point) -> anyhow::Result<()> {
        display.clear(Color::BLACK);

        let Some(snapshot) = self.source.poll()? else {
            // Nothing playing: the blank frame still gets presented.
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

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::text::FontStore;
    use crate::geometry::RENDER_CENTER;
    use crate::playback::PlaybackSnapshot;
    use std::path::PathBuf;

    struct NothingPlaying;

    impl PlaybackSource for NothingPlaying {
        fn poll(&mut self) -> anyhow::Result<Option<PlaybackSnapshot>> {
            Ok(None)
        }
    }

    #[test]
    fn nothing_playing_renders_a_blank_frame_without_error() {
        let fb = std::env::temp_dir().join(format!(
            "roundplay-view-{}-nothing",
            std::process::id()
        ));
        let mut display =
            Display::new_raw(16, 16, FontStore::new(PathBuf::from(".")), fb.clone());
        let mut view = NowPlayingView::new(Box::new(NothingPlaying));

        view.produce_frame(&mut display, RENDER_CENTER).unwrap();
        display.present().unwrap();

        // No track, artist, or progress visuals: every pixel stays black.
        let written = std::fs::read(&fb).unwrap();
        assert_eq!(written.len(), 16 * 16 * 2);
        assert!(written.iter().all(|&b| b == 0));
        let _ = std::fs::remove_file(&fb);
    }

    #[test]
    fn native_cadence_is_one_hertz() {
        let view = NowPlayingView::new(Box::new(NothingPlaying));
        assert_eq!(view.target_fps(), 1.0);
    }
}
