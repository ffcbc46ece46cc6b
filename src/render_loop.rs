// src/render_loop.rs

//! The fixed-cadence render loop: one input drain, one poll, one composite,
//! one present per tick, with cooperative shutdown.
//!
//! The loop is written once and parameterized by a `FrameSource`; the three
//! views supply only their content. Shutdown is a small state machine:
//! `Running` until a quit/escape/interrupt event is drained, then one
//! `Stopping` tick that releases the backend surface exactly once, then
//! `Stopped`.

use crate::color::Color;
use crate::display::Display;
use crate::geometry::{Point, RENDER_CENTER};
use crate::input::{EventPump, InputEvent};
use crate::touch::{TouchEvent, TouchQueue};
use log::{debug, info};
use std::time::{Duration, Instant};

/// Loop lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

/// Per-view frame content. The loop calls `produce_frame` once per tick
/// with the composition target and the panel's render center.
pub trait FrameSource {
    /// The view's native cadence in frames per second.
    fn target_fps(&self) -> f64;

    fn produce_frame(&mut self, display: &mut Display, center: Point) -> anyhow::Result<()>;
}

/// The configurable render loop. Owns the display for the process lifetime;
/// input and content are injected seams.
pub struct RenderLoop<'a> {
    display: Display,
    pump: &'a mut dyn EventPump,
    source: &'a mut dyn FrameSource,
    touches: TouchQueue,
    state: LoopState,
    period: Duration,
}

impl<'a> RenderLoop<'a> {
    /// Builds the loop. `fps_override` replaces the view's native cadence
    /// when set (diagnostic aid).
    pub fn new(
        display: Display,
        pump: &'a mut dyn EventPump,
        source: &'a mut dyn FrameSource,
        touches: TouchQueue,
        fps_override: Option<f64>,
    ) -> Self {
        let fps = fps_override.unwrap_or_else(|| source.target_fps()).max(0.1);
        RenderLoop {
            display,
            pump,
            source,
            touches,
            state: LoopState::Running,
            period: Duration::from_secs_f64(1.0 / fps),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Runs to completion: initial blank frame, then ticks at the target
    /// cadence until stopped. Unhandled frame errors propagate out.
    pub fn run(&mut self) -> anyhow::Result<()> {
        self.display.clear(Color::BLACK);
        self.display.present()?;

        let mut next = Instant::now();
        while self.state != LoopState::Stopped {
            self.tick()?;
            if self.state != LoopState::Running {
                continue;
            }
            // Deadline accumulator: a slow frame eats into the next sleep
            // instead of shifting every subsequent tick.
            next += self.period;
            let now = Instant::now();
            match next.checked_duration_since(now) {
                Some(remaining) => std::thread::sleep(remaining),
                None => next = now,
            }
        }
        info!("Render loop stopped");
        Ok(())
    }

    /// One iteration of the loop's state machine.
    pub fn tick(&mut self) -> anyhow::Result<()> {
        match self.state {
            LoopState::Stopped => Ok(()),
            LoopState::Stopping => {
                self.display.release();
                self.state = LoopState::Stopped;
                Ok(())
            }
            LoopState::Running => {
                for event in self.pump.poll_events() {
                    match event {
                        InputEvent::Quit | InputEvent::EscapeKey | InputEvent::Interrupt => {
                            info!("Shutdown requested by {:?}", event);
                            self.state = LoopState::Stopping;
                        }
                    }
                }
                for event in self.touches.drain() {
                    self.touch(event);
                }
                if self.state != LoopState::Running {
                    return Ok(());
                }

                self.source.produce_frame(&mut self.display, RENDER_CENTER)?;
                self.display.present()
            }
        }
    }

    /// Touch hook: a no-op for now, reserved for input-driven interaction
    /// such as skip and pause.
    fn touch(&mut self, event: TouchEvent) {
        debug!("Touch at ({}, {}) pressed={}", event.x, event.y, event.pressed);
    }
}
