//! Process-scoped input settings shared by every button
//!
//! Created once at startup (usually from [`InputConfig`]) and handed to the
//! controller as an `Rc`. Values stay mutable for the life of the process.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::config::InputConfig;
use crate::keys::Namespace;

/// Milliseconds; signed because degenerate (zero or negative) timings are accepted
pub type Millis = i64;

pub const DEFAULT_REPEAT_DELAY: Millis = 500;
pub const DEFAULT_REPEAT_INTERVAL: Millis = 30;

#[derive(Debug)]
pub struct InputSettings {
    repeat_delay: Cell<Millis>,
    repeat_interval: Cell<Millis>,
    user_events_enabled: Cell<bool>,
}

impl InputSettings {
    pub fn new(repeat_delay: Millis, repeat_interval: Millis, user_events_enabled: bool) -> Self {
        Self {
            repeat_delay: Cell::new(repeat_delay),
            repeat_interval: Cell::new(repeat_interval),
            user_events_enabled: Cell::new(user_events_enabled),
        }
    }

    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(
            config.repeat.delay_ms,
            config.repeat.interval_ms,
            config.events.user_enabled,
        )
    }

    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub fn repeat_delay(&self) -> Millis {
        self.repeat_delay.get()
    }

    pub fn repeat_interval(&self) -> Millis {
        self.repeat_interval.get()
    }

    /// Overwrites the repeat defaults for all buttons lacking their own timing
    ///
    /// No bounds validation: zero or negative values make held buttons
    /// repeat on every tick.
    pub fn set_repeat_default(&self, delay: Millis, interval: Millis) {
        debug!(delay, interval, "Repeat defaults changed");
        self.repeat_delay.set(delay);
        self.repeat_interval.set(interval);
    }

    pub fn user_events_enabled(&self) -> bool {
        self.user_events_enabled.get()
    }

    /// Switches raises between the user and system key bands
    pub fn set_user_events_enabled(&self, enabled: bool) {
        debug!(enabled, "User events toggled");
        self.user_events_enabled.set(enabled);
    }

    /// Namespace a raise selects right now
    pub fn namespace(&self) -> Namespace {
        if self.user_events_enabled() {
            Namespace::User
        } else {
            Namespace::System
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self::new(DEFAULT_REPEAT_DELAY, DEFAULT_REPEAT_INTERVAL, true)
    }
}
