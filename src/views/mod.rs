// src/views/mod.rs

//! The frame content providers: one `FrameSource` per view, sharing the
//! loop and display machinery.

pub mod clock;
pub mod now_playing;
pub mod progress;

/// The one UI font, looked up by file name in the configured font dir.
pub const UI_FONT: &str = "Gotham.ttf";

/// Title size in pixels.
pub const TITLE_PX: f32 = 48.0;
/// Artist-line size in pixels.
pub const ARTISTS_PX: f32 = 32.0;
/// Vertical offset of the artist line below the render center.
pub const ARTISTS_OFFSET: i32 = 50;
