//! Arcade Input
//!
//! Button input for a small handheld controller: edge signals in, categorized
//! press/release/repeat events out, with separate user and system handler
//! lists and an optional relay link to a peer device.
//!
//! # Architecture
//!
//! ```text
//! hardware / simulator / relay peer
//!          ↓ (Bridge, Controller::press/release)
//!   InternalDown / InternalUp on the EventBus
//!          ↓
//!   Button state machine ── relay? ──→ RelaySink
//!          ↓ user or system band key
//!   HandlerRegistry dispatch (user slot, then system list)
//! ```

/// Publish/subscribe bus keyed by (event code, source id)
pub mod bus;

/// Button state machine, repeat timer and handler wiring
pub mod button;

/// Inbound JSON bridge from a simulator or relay peer
pub mod bridge;

/// Build-time information (git SHA, target, compiler)
pub mod build_info;

/// Profile-based configuration loading
pub mod config;

/// The fixed set of buttons on the device
pub mod controller;

/// Raw key constants, logical events and button identities
pub mod keys;

/// Per-button user and system handler lists
pub mod registry;

/// Relay packets and sinks
pub mod relay;

/// Start-up self test
pub mod selftest;

/// Process-scoped repeat defaults and the user/system toggle
pub mod settings;

pub use bus::{BusEvent, EventBus, EventWait, LocalBus};
pub use button::{Button, ButtonWiring};
pub use bridge::{Bridge, BridgeError, ButtonToken, Direction, ShieldMessage};
pub use config::InputConfig;
pub use controller::{Controller, TickClock};
pub use keys::{ButtonEvent, ButtonId, EventCode, Namespace, PresenceEvent, RawKey, SourceId};
pub use registry::Handler;
pub use relay::{QueuedRelay, RelayError, RelayPacket, RelaySink};
pub use settings::{InputSettings, Millis};
