//! Scan producers that sit in front of [`crate::Engine::submit_scan`].
//!
//! Both take timestamps from the caller instead of reading a clock, so the
//! same code drives a live event loop and a deterministic test.

use std::time::{Duration, Instant};

use crate::config::IntakeConfig;

// ---------------------------------------------------------------------------
// Keyboard wedge
// ---------------------------------------------------------------------------

/// Collects keystrokes from a keyboard-wedge scanner into whole codes.
///
/// The scanner sends no reliable terminator, so a code ends when no key has
/// arrived for `gap`.
#[derive(Debug, Clone)]
pub struct WedgeBuffer {
    gap: Duration,
    buf: String,
    last_key: Option<Instant>,
}

impl WedgeBuffer {
    pub fn new(gap: Duration) -> Self {
        Self {
            gap,
            buf: String::new(),
            last_key: None,
        }
    }

    pub fn from_config(config: &IntakeConfig) -> Self {
        Self::new(config.wedge_gap())
    }

    /// Feed one key event. Named keys ("Shift", "Enter", ...) are ignored.
    ///
    /// Returns the previous code if this key arrived after the gap elapsed.
    pub fn push(&mut self, key: &str, at: Instant) -> Option<String> {
        let mut chars = key.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };

        let flushed = self.poll(at);
        self.buf.push(ch);
        self.last_key = Some(at);
        flushed
    }

    /// Code completed by inactivity, if any.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let last = self.last_key?;
        if now.saturating_duration_since(last) >= self.gap {
            self.flush()
        } else {
            None
        }
    }

    /// Emit whatever is buffered regardless of timing.
    pub fn flush(&mut self) -> Option<String> {
        self.last_key = None;
        if self.buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buf))
        }
    }

    /// When `poll` would next produce a code.
    pub fn deadline(&self) -> Option<Instant> {
        self.last_key.map(|t| t + self.gap)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Camera decoder
// ---------------------------------------------------------------------------

/// Drops repeat decodes of the same text within a cooldown window.
///
/// An image decoder reports the same barcode on every frame while it stays in
/// view; only the first read in each window is passed on.
#[derive(Debug, Clone)]
pub struct DecodeCoalescer {
    cooldown: Duration,
    last: Option<(String, Instant)>,
}

impl DecodeCoalescer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    pub fn from_config(config: &IntakeConfig) -> Self {
        Self::new(config.camera_cooldown())
    }

    /// `true` if `text` should be submitted.
    pub fn accept(&mut self, text: &str, at: Instant) -> bool {
        if let Some((last_text, last_at)) = &self.last {
            if last_text == text && at.saturating_duration_since(*last_at) < self.cooldown {
                return false;
            }
        }
        self.last = Some((text.to_string(), at));
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
