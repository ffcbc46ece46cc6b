// src/artwork.rs

//! Album-artwork fetch and decode: one blocking HTTP GET per call, decoded
//! into the RGBA pixel format the renderer composites.

use anyhow::Context;
use image::RgbaImage;
use log::debug;
use reqwest::blocking::Client;

/// Fetches and decodes the artwork at `url`. No caching: the now-playing
/// view re-fetches every tick, matching the one-poll-one-tick cadence.
pub fn fetch_artwork(client: &Client, url: &str) -> anyhow::Result<RgbaImage> {
    debug!("Fetching artwork {}", url);
    let bytes = client
        .get(url)
        .send()
        .with_context(|| format!("fetching artwork {}", url))?
        .error_for_status()
        .with_context(|| format!("artwork request {}", url))?
        .bytes()
        .context("reading artwork body")?;
    let image = image::load_from_memory(&bytes)
        .with_context(|| format!("decoding artwork {}", url))?;
    Ok(image.to_rgba8())
}
