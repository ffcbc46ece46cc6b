// src/input.rs

//! Input sources for the render loop: the raw-mode keyboard pump and the
//! interrupt-signal flag, folded into one event stream so quit, escape, and
//! SIGINT all drive the same shutdown path.

use anyhow::Context;
use libc::STDIN_FILENO;
use log::{info, warn};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};
use termios::{tcsetattr, Termios, ECHO, ICANON, ISIG, TCSANOW, VMIN, VTIME};

/// Events the loop reacts to. All three currently request shutdown; they are
/// kept distinct for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// An explicit quit request (the `q` key).
    Quit,
    /// The escape key.
    EscapeKey,
    /// SIGINT or SIGTERM arrived since the last poll.
    Interrupt,
}

/// Drains whatever input arrived since the last tick. Non-blocking.
pub trait EventPump {
    fn poll_events(&mut self) -> Vec<InputEvent>;
}

// Signal handler context allows nothing richer than a flag store; the pump
// folds it into the event stream at the top of each tick.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_interrupt(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::Relaxed);
}

/// Routes SIGINT and SIGTERM to the interrupt flag so an in-flight frame
/// completes and teardown runs instead of the process dying mid-write.
pub fn install_signal_handlers() -> anyhow::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(handle_interrupt),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // SAFETY: the handler only stores to an atomic flag, which is
    // async-signal-safe.
    unsafe {
        sigaction(Signal::SIGINT, &action).context("installing SIGINT handler")?;
        sigaction(Signal::SIGTERM, &action).context("installing SIGTERM handler")?;
    }
    Ok(())
}

/// Keyboard pump over stdin. When stdin is a TTY it is switched to raw
/// non-blocking mode for the process lifetime and restored on drop; when it
/// is not (service deployment), the pump degrades to signal-only.
pub struct ConsolePump {
    original_termios: Option<Termios>,
}

impl ConsolePump {
    pub fn new() -> Self {
        // SAFETY: isatty on a process-standard descriptor.
        let is_tty = unsafe { libc::isatty(STDIN_FILENO) } == 1;
        if !is_tty {
            info!("stdin is not a TTY; keyboard quit keys disabled");
            return ConsolePump {
                original_termios: None,
            };
        }

        let original = match Termios::from_fd(STDIN_FILENO) {
            Ok(t) => t,
            Err(e) => {
                warn!("Failed to read termios: {}. Keyboard disabled.", e);
                return ConsolePump {
                    original_termios: None,
                };
            }
        };

        let mut raw = original;
        raw.c_lflag &= !(ECHO | ICANON | ISIG);
        raw.c_cc[VMIN] = 0;
        raw.c_cc[VTIME] = 0;
        if let Err(e) = tcsetattr(STDIN_FILENO, TCSANOW, &raw) {
            warn!("Failed to enter raw mode: {}. Keyboard disabled.", e);
            return ConsolePump {
                original_termios: None,
            };
        }

        if let Err(e) = set_nonblocking() {
            warn!("Failed to make stdin non-blocking: {:#}", e);
        }

        ConsolePump {
            original_termios: Some(original),
        }
    }

    fn read_pending(&self) -> Vec<u8> {
        if self.original_termios.is_none() {
            return Vec::new();
        }
        let mut pending = Vec::new();
        let mut buf = [0u8; 32];
        loop {
            // SAFETY: reading into a stack buffer of the stated length from
            // a descriptor this process owns.
            let n = unsafe {
                libc::read(STDIN_FILENO, buf.as_mut_ptr() as *mut libc::c_void, buf.len())
            };
            if n <= 0 {
                break;
            }
            pending.extend_from_slice(&buf[..n as usize]);
        }
        pending
    }
}

impl EventPump for ConsolePump {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        if INTERRUPTED.swap(false, Ordering::Relaxed) {
            events.push(InputEvent::Interrupt);
        }
        for byte in self.read_pending() {
            match byte {
                0x1B => events.push(InputEvent::EscapeKey),
                b'q' | b'Q' => events.push(InputEvent::Quit),
                _ => {}
            }
        }
        events
    }
}

impl Default for ConsolePump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConsolePump {
    fn drop(&mut self) {
        if let Some(original) = self.original_termios.take() {
            if let Err(e) = tcsetattr(STDIN_FILENO, TCSANOW, &original) {
                warn!("Failed to restore terminal attributes: {}", e);
            }
        }
    }
}

fn set_nonblocking() -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let flags = fcntl(&stdin, FcntlArg::F_GETFL).context("F_GETFL on stdin")?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(&stdin, FcntlArg::F_SETFL(flags)).context("F_SETFL on stdin")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_flag_is_folded_into_the_event_stream_once() {
        // Signal-only pump: no termios was touched, nothing to restore.
        let mut pump = ConsolePump {
            original_termios: None,
        };
        INTERRUPTED.store(true, Ordering::Relaxed);
        assert_eq!(pump.poll_events(), vec![InputEvent::Interrupt]);
        // The flag is consumed; a second poll sees nothing.
        assert!(pump.poll_events().is_empty());
    }
}
