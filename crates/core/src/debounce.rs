//! Settle window for hosts that scroll a carousel programmatically and must
//! not mistake the resulting scroll events for user input.
//!
//! Time is passed in explicitly; nothing here sleeps or spawns.

use std::time::{Duration, Instant};

use crate::config::UiConfig;

#[derive(Clone, Debug)]
pub struct SettleDebounce {
    delay: Duration,
    settles_at: Option<Instant>,
}

impl SettleDebounce {
    pub fn new(delay: Duration) -> Self {
        Self { delay, settles_at: None }
    }

    pub fn from_config(ui: &UiConfig) -> Self {
        Self::new(Duration::from_millis(ui.settle_delay_ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Call right before scrolling programmatically.
    pub fn mark_programmatic(&mut self, now: Instant) {
        self.settles_at = Some(now + self.delay);
    }

    pub fn is_settling(&self, now: Instant) -> bool {
        self.settles_at.is_some_and(|settles_at| now < settles_at)
    }

    /// True when a scroll event observed at `now` should be treated as user
    /// driven. Clears the window once it has elapsed.
    pub fn should_react(&mut self, now: Instant) -> bool {
        if self.is_settling(now) {
            return false;
        }
        self.settles_at = None;
        true
    }
}
