// src/main.rs

//! roundplay: a now-playing display for a round SBC touchscreen.
//!
//! Startup wires the whole application context explicitly: config, backend
//! selection, display, playback client, touch bridge, and the render loop.
//! No module-scope mutable state.

pub mod artwork;
pub mod color;
pub mod config;
pub mod display;
pub mod geometry;
pub mod input;
pub mod playback;
pub mod render_loop;
pub mod spotify;
pub mod touch;
pub mod views;

use crate::config::Config;
use crate::display::backend::{
    fbdev_path, select_backend, video_driver_override, DeviceNodeProbe, SurfaceFlags,
};
use crate::display::text::FontStore;
use crate::display::Display;
use crate::input::ConsolePump;
use crate::render_loop::{FrameSource, RenderLoop};
use crate::spotify::{SpotifyClient, SCOPE_MODIFY_PLAYBACK, SCOPE_READ_PLAYBACK};
use crate::touch::{TouchBridge, TouchQueue};
use crate::views::{clock::ClockView, now_playing::NowPlayingView, progress::ProgressView};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    NowPlaying,
    Progress,
    Clock,
}

/// Now-playing display for a round SBC touchscreen.
#[derive(Debug, Parser)]
#[command(name = "roundplay", version, about)]
struct Cli {
    /// Path of the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Which view to run.
    #[arg(long, value_enum, default_value_t = View::NowPlaying)]
    view: View,

    /// Override the view's native cadence (frames per second).
    #[arg(long)]
    fps: Option<f64>,

    /// Request the elevated playback-control scope during authorization.
    #[arg(long)]
    allow_playback_control: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config).context("loading configuration")?;

    if let Ok(display_server) = std::env::var("DISPLAY") {
        info!("Display: {}", display_server);
    }

    input::install_signal_handlers()?;

    let selection = select_backend(
        &mut DeviceNodeProbe,
        video_driver_override().as_deref(),
        SurfaceFlags::STANDARD,
    )?;
    let fonts = FontStore::new(config.font_dir.clone());
    let display = Display::new(&selection, fonts, fbdev_path())
        .context("creating display")?;

    // The touch bridge records into a queue the loop drains each tick. The
    // sensor driver would call `bridge.deliver(...)` from its own context.
    let touches = TouchQueue::default();
    let bridge = TouchBridge::new();
    {
        let queue = touches.clone();
        bridge.on_touch(move |event| queue.push(event));
    }

    let mut source: Box<dyn FrameSource> = match cli.view {
        View::Clock => Box::new(ClockView::new(&config.test_image)),
        View::NowPlaying | View::Progress => {
            let mut scopes = vec![SCOPE_READ_PLAYBACK];
            if cli.allow_playback_control {
                scopes.push(SCOPE_MODIFY_PLAYBACK);
            }
            let client = SpotifyClient::connect(&config, &scopes)
                .context("connecting to playback service")?;
            match cli.view {
                View::Progress => Box::new(ProgressView::new(Box::new(client))),
                _ => Box::new(NowPlayingView::new(Box::new(client))),
            }
        }
    };

    let mut pump = ConsolePump::new();
    let mut render_loop = RenderLoop::new(display, &mut pump, source.as_mut(), touches, cli.fps);
    render_loop.run()?;

    info!("roundplay exited cleanly");
    Ok(())
}
