// src/playback.rs

//! The playback-state model and the polling seam the render loop depends on.
//!
//! `PlaybackSource` is the one capability the views need from the remote
//! service: one synchronous poll per tick, returning a validated snapshot or
//! nothing. The production implementation lives in `spotify.rs`; tests
//! script the trait directly.

use log::warn;

/// One observation of the remote player, re-fetched every cycle.
///
/// Invariants established at construction: `duration_ms > 0` and
/// `progress_ms <= duration_ms`. Layout math may rely on both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub track_name: String,
    /// Ordered as the service reports them; joined with `", "` for display.
    pub artist_names: Vec<String>,
    pub artwork_url: String,
    /// Native artwork dimensions as reported by the service.
    pub artwork_width: u32,
    pub artwork_height: u32,
    pub progress_ms: u32,
    pub duration_ms: u32,
}

impl PlaybackSnapshot {
    /// Builds a snapshot from wire data, enforcing the model invariants.
    ///
    /// A zero-duration item has no usable progress geometry and is dropped
    /// (logged, treated as nothing playing). Progress beyond the duration is
    /// clamped to it.
    #[allow(clippy::too_many_arguments)]
    pub fn from_wire(
        track_name: String,
        artist_names: Vec<String>,
        artwork_url: String,
        artwork_width: u32,
        artwork_height: u32,
        progress_ms: u32,
        duration_ms: u32,
    ) -> Option<Self> {
        if duration_ms == 0 {
            warn!(
                "Dropping zero-duration item {:?}; treating as nothing playing",
                track_name
            );
            return None;
        }
        Some(PlaybackSnapshot {
            track_name,
            artist_names,
            artwork_url,
            artwork_width,
            artwork_height,
            progress_ms: progress_ms.min(duration_ms),
            duration_ms,
        })
    }
}

/// One synchronous poll of the remote player. `Ok(None)` means nothing is
/// playing; transport and auth errors propagate to the loop.
pub trait PlaybackSource {
    fn poll(&mut self) -> anyhow::Result<Option<PlaybackSnapshot>>;
}
