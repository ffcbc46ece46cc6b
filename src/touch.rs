// src/touch.rs

//! Bridges the touch-sensor driver's callback into the render loop.
//!
//! The sensor driver delivers events from an unspecified foreign context, so
//! the bridge's contract is narrow: delivery must not block and must not
//! unwind into the caller. Handlers only record state for the next tick to
//! observe.

use log::error;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

/// One raw touch report from the sensor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchEvent {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub pressed: bool,
}

type Handler = Arc<dyn Fn(TouchEvent) + Send + Sync>;

/// Registration point for the single touch callback.
///
/// `on_touch` installs the handler; `deliver` is what the sensor driver's
/// context invokes. The default handler discards events.
pub struct TouchBridge {
    handler: Mutex<Handler>,
}

impl TouchBridge {
    pub fn new() -> Self {
        TouchBridge {
            handler: Mutex::new(Arc::new(|_| {})),
        }
    }

    /// Replaces the installed handler.
    pub fn on_touch(&self, handler: impl Fn(TouchEvent) + Send + Sync + 'static) {
        if let Ok(mut slot) = self.handler.lock() {
            *slot = Arc::new(handler);
        }
    }

    /// Forwards one raw report to the installed handler. A panicking handler
    /// is caught here so it cannot unwind into the foreign delivery context.
    pub fn deliver(&self, id: u8, x: u16, y: u16, pressed: bool) {
        let handler = match self.handler.lock() {
            Ok(slot) => Arc::clone(&slot),
            Err(_) => return,
        };
        let event = TouchEvent { id, x, y, pressed };
        if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
            error!("Touch handler panicked on {:?}; event dropped", event);
        }
    }
}

impl Default for TouchBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared queue the bridge handler records into and the loop drains once per
/// tick. Cloning shares the underlying queue.
#[derive(Clone, Default)]
pub struct TouchQueue {
    pending: Arc<Mutex<VecDeque<TouchEvent>>>,
}

impl TouchQueue {
    pub fn push(&self, event: TouchEvent) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push_back(event);
        }
    }

    /// Removes and returns all pending events in arrival order.
    pub fn drain(&self) -> Vec<TouchEvent> {
        match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}
