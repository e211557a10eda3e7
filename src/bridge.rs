//! Inbound bridge from a simulator or relay peer
//!
//! The peer sends JSON messages. Button messages name a button by token and
//! are turned into down/up raises; display messages become presence events.
//! Unknown tokens and message types are dropped.

use std::cell::Cell;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::controller::Controller;
use crate::keys::{ButtonId, PresenceEvent};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed bridge message: {0}")]
    Message(#[from] serde_json::Error),
}

/// Symbolic button names used by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonToken {
    Left,
    Right,
    Up,
    Down,
    A,
    B,
    Menu,
}

impl ButtonToken {
    pub fn button_id(self) -> ButtonId {
        match self {
            Self::Left => ButtonId::LEFT,
            Self::Right => ButtonId::RIGHT,
            Self::Up => ButtonId::UP,
            Self::Down => ButtonId::DOWN,
            Self::A => ButtonId::A,
            Self::B => ButtonId::B,
            Self::Menu => ButtonId::MENU,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown button token {0:?}")]
pub struct UnknownToken(pub String);

impl FromStr for ButtonToken {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            "menu" => Ok(Self::Menu),
            other => Err(UnknownToken(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

/// Messages understood by the bridge; other fields (e.g. `runId`) are ignored
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ShieldMessage {
    ButtonDown {
        #[serde(rename = "buttonId")]
        button_id: String,
    },
    ButtonUp {
        #[serde(rename = "buttonId")]
        button_id: String,
    },
    DisplayOn,
    DisplayOff,
    /// Screen, palette and handshake messages handled elsewhere
    #[serde(other)]
    Other,
}

pub struct Bridge<'c> {
    controller: &'c Controller,
    relayed: bool,
    display_on: Cell<Option<bool>>,
}

impl<'c> Bridge<'c> {
    /// `relayed` forwards resolved button events over the controller's relay
    /// link; otherwise they are injected as local press/release signals
    pub fn new(controller: &'c Controller, relayed: bool) -> Self {
        Self {
            controller,
            relayed,
            display_on: Cell::new(None),
        }
    }

    /// Last display state reported by the peer, if any
    pub fn display_present(&self) -> Option<bool> {
        self.display_on.get()
    }

    /// Resolves `token` and raises the button event; unknown tokens are dropped
    pub fn deliver(&self, token: &str, direction: Direction) {
        let token = match token.parse::<ButtonToken>() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Dropping bridged button event");
                return;
            }
        };

        let id = token.button_id();
        debug!(?token, ?direction, relayed = self.relayed, "Bridged button event");

        if !self.relayed {
            // Local delivery goes through the edge signal so pressed state tracks the peer
            match direction {
                Direction::Down => self.controller.press(id),
                Direction::Up => self.controller.release(id),
            }
            return;
        }

        let Some(button) = self.controller.button(id) else {
            return;
        };
        match direction {
            Direction::Down => button.raise_button_down(true),
            Direction::Up => button.raise_button_up(true),
        }
    }

    pub fn handle(&self, message: &ShieldMessage) {
        match message {
            ShieldMessage::ButtonDown { button_id } => self.deliver(button_id, Direction::Down),
            ShieldMessage::ButtonUp { button_id } => self.deliver(button_id, Direction::Up),
            ShieldMessage::DisplayOn => {
                self.display_on.set(Some(true));
                self.controller.raise_presence(PresenceEvent::Present);
            }
            ShieldMessage::DisplayOff => {
                self.display_on.set(Some(false));
                self.controller.raise_presence(PresenceEvent::Absent);
            }
            ShieldMessage::Other => {}
        }
    }

    /// Decodes one JSON message and handles it
    pub fn handle_json(&self, text: &str) -> Result<(), BridgeError> {
        let message: ShieldMessage = serde_json::from_str(text)?;
        self.handle(&message);
        Ok(())
    }
}
