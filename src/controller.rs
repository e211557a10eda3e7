//! Controller: the fixed set of buttons on the device
//!
//! Owns every wired button plus the wildcard `any` button, tracks whether a
//! real signal has ever been observed, and drives the repeat timers.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, info};

use crate::bus::{DEFAULT_PRIORITY, EventBus, EventWait, LocalBus};
use crate::button::{Button, ButtonWiring};
use crate::config::InputConfig;
use crate::keys::{
    ButtonEvent, ButtonId, Namespace, PRESENCE_SOURCE, PresenceEvent, RawKey, SourceId,
};
use crate::registry::Handler;
use crate::relay::{RelayError, RelayPacket, RelaySink};
use crate::settings::{InputSettings, Millis};

pub struct Controller {
    bus: Rc<dyn EventBus>,
    settings: Rc<InputSettings>,
    connected: Rc<Cell<bool>>,
    buttons: Vec<Rc<Button>>,
    any: Rc<Button>,
}

impl Controller {
    /// Creates the controller and wires every button to the bus
    pub fn new(
        bus: Rc<dyn EventBus>,
        settings: Rc<InputSettings>,
        relay: Option<Rc<dyn RelaySink>>,
    ) -> Self {
        let connected = Rc::new(Cell::new(false));

        let mut wiring = ButtonWiring::new(Rc::clone(&bus), Rc::clone(&settings));
        if let Some(relay) = relay {
            wiring = wiring.with_relay(relay);
        }

        let any = Button::new(ButtonId::Wildcard, wiring.clone());
        let wiring = wiring.with_owner(&connected);
        let buttons = ButtonId::WIRED
            .iter()
            .map(|&id| Button::new(id, wiring.clone()))
            .collect();

        debug!(buttons = ButtonId::WIRED.len(), "Controller wired");

        Self {
            bus,
            settings,
            connected,
            buttons,
            any,
        }
    }

    /// Creates a controller on a fresh local bus with settings from `config`
    pub fn from_config(config: &InputConfig, relay: Option<Rc<dyn RelaySink>>) -> Self {
        info!(profile = %config.profile, ?config.repeat, "Input configuration");
        let settings = InputSettings::from_config(config).shared();
        Self::new(LocalBus::shared(), settings, relay)
    }

    pub fn bus(&self) -> &Rc<dyn EventBus> {
        &self.bus
    }

    pub fn settings(&self) -> &Rc<InputSettings> {
        &self.settings
    }

    /// True once any owned button has observed a real signal
    pub fn connected(&self) -> bool {
        self.connected.get()
    }

    /// Looks up a button; `ButtonId::Wildcard` yields the `any` button
    pub fn button(&self, id: ButtonId) -> Option<&Rc<Button>> {
        if id.is_wildcard() {
            return Some(&self.any);
        }
        self.buttons.iter().find(|button| button.id() == id)
    }

    /// Wired buttons, in declaration order
    pub fn buttons(&self) -> &[Rc<Button>] {
        &self.buttons
    }

    pub fn any(&self) -> &Rc<Button> {
        &self.any
    }

    pub fn left(&self) -> &Rc<Button> {
        &self.buttons[0]
    }

    pub fn up(&self) -> &Rc<Button> {
        &self.buttons[1]
    }

    pub fn right(&self) -> &Rc<Button> {
        &self.buttons[2]
    }

    pub fn down(&self) -> &Rc<Button> {
        &self.buttons[3]
    }

    pub fn a(&self) -> &Rc<Button> {
        &self.buttons[4]
    }

    pub fn b(&self) -> &Rc<Button> {
        &self.buttons[5]
    }

    pub fn menu(&self) -> &Rc<Button> {
        &self.buttons[6]
    }

    /// Signals a press edge for `id`, as the hardware or simulator would
    pub fn press(&self, id: ButtonId) {
        self.bus.raise(RawKey::InternalDown.code(), id.source());
    }

    /// Signals a release edge for `id`
    pub fn release(&self, id: ButtonId) {
        self.bus.raise(RawKey::InternalUp.code(), id.source());
    }

    /// Advances every button's repeat timer by `dt` milliseconds
    pub fn update(&self, dt: Millis) {
        for button in &self.buttons {
            button.update(dt);
        }
    }

    /// Overwrites the repeat defaults for buttons without their own timing
    pub fn set_repeat_default(&self, delay: Millis, interval: Millis) {
        self.settings.set_repeat_default(delay, interval);
    }

    pub fn set_user_events_enabled(&self, enabled: bool) {
        self.settings.set_user_events_enabled(enabled);
    }

    /// Runs `handler` whenever the presence event is raised
    pub fn on_presence(&self, event: PresenceEvent, handler: Handler) {
        self.bus.subscribe(
            event.code(),
            PRESENCE_SOURCE,
            DEFAULT_PRIORITY,
            Rc::new(move |_| handler()),
        );
    }

    pub fn raise_presence(&self, event: PresenceEvent) {
        debug!(?event, "Presence changed");
        self.bus.raise(event.code(), PRESENCE_SOURCE);
    }

    /// Completes when any button is next pressed
    pub fn pause_until_any_button_pressed(&self) -> EventWait {
        let key = RawKey::for_event(ButtonEvent::Pressed, Namespace::User);
        self.bus.wait_for(key.code(), SourceId::ANY)
    }

    /// Raises an event received from the relay peer on the local bus
    pub fn receive_relay(&self, bytes: &[u8]) -> Result<RelayPacket, RelayError> {
        let packet = RelayPacket::decode(bytes)?;
        debug!(key = packet.key.value(), button = %packet.button, "Relay receive");
        self.bus.raise(packet.key.code(), packet.button.source());
        Ok(packet)
    }
}

/// Converts host loop timestamps into tick deltas for [`Controller::update`]
#[derive(Debug, Default)]
pub struct TickClock {
    last: Option<Instant>,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds since the previous call; 0 on the first call
    pub fn tick(&mut self, now: Instant) -> Millis {
        let dt = self
            .last
            .map(|last| now.saturating_duration_since(last).as_millis())
            .map_or(0, |ms| Millis::try_from(ms).unwrap_or(Millis::MAX));
        self.last = Some(now);
        dt
    }
}
