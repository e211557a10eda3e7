//! Relay channel: forwards button events to a peer instead of the local bus
//!
//! A packet carries the relay discriminant, the selected raw key and the
//! button id. Raw keys do not fit in a byte, so the key travels as a
//! little-endian u16 and a packet is four bytes on the wire.

use std::cell::RefCell;
use std::collections::VecDeque;

use thiserror::Error;
use tracing::trace;

use crate::keys::{ButtonId, RawKey};

/// Discriminant marking a relay packet as a button event
pub const BUTTON_PRESS_CHANNEL: u8 = 1;

/// Encoded size of a [`RelayPacket`]
///
/// A packet has three fields (channel, key, button) but four bytes: the key
/// field is a u16 since raw keys start at 2048. A peer expecting a
/// three-byte record with a one-byte key cannot read these packets.
pub const PACKET_LEN: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("relay packet must be 4 bytes, got {0}")]
    Length(usize),

    #[error("relay packet is not a button event (channel {0})")]
    Channel(u8),

    #[error("unknown raw key {0} in relay packet")]
    Key(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayPacket {
    pub channel: u8,
    pub key: RawKey,
    pub button: ButtonId,
}

impl RelayPacket {
    pub fn button_event(key: RawKey, button: ButtonId) -> Self {
        Self {
            channel: BUTTON_PRESS_CHANNEL,
            key,
            button,
        }
    }

    pub fn encode(&self) -> [u8; PACKET_LEN] {
        let [lo, hi] = self.key.value().to_le_bytes();
        [self.channel, lo, hi, self.button.number()]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, RelayError> {
        let &[channel, lo, hi, button] = bytes else {
            return Err(RelayError::Length(bytes.len()));
        };
        if channel != BUTTON_PRESS_CHANNEL {
            return Err(RelayError::Channel(channel));
        }
        let value = u16::from_le_bytes([lo, hi]);
        let key = RawKey::from_value(value).ok_or(RelayError::Key(value))?;

        Ok(Self {
            channel,
            key,
            button: ButtonId::from_number(button),
        })
    }
}

/// Outbound side of the relay link
pub trait RelaySink {
    fn send(&self, packet: RelayPacket);
}

/// Relay sink that queues packets in memory until the transport drains them
#[derive(Debug, Default)]
pub struct QueuedRelay {
    queue: RefCell<VecDeque<RelayPacket>>,
}

impl QueuedRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub fn pop(&self) -> Option<RelayPacket> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn drain(&self) -> Vec<RelayPacket> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

impl RelaySink for QueuedRelay {
    fn send(&self, packet: RelayPacket) {
        trace!(key = packet.key.value(), button = %packet.button, "Relay send");
        self.queue.borrow_mut().push_back(packet);
    }
}
