//! Button state machine
//!
//! A button tracks pressed/released from the internal edge signals raised on
//! the bus, raises logical down/up/repeat events, and dispatches them to its
//! user and system handlers.
//!
//! ```text
//! InternalDown/InternalUp (bus, priority 16)
//!        ↓ set_pressed (no-op if already in that state)
//! raise Pressed/Released ── relay? ──→ RelaySink
//!        ↓ local bus, user or system band
//! dispatch subscription (created once per event kind)
//!        ↓ snapshot
//! user handler, then system handlers
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::bus::{DEFAULT_PRIORITY, EventBus, EventWait};
use crate::keys::{ButtonEvent, ButtonId, Namespace, RawKey};
use crate::registry::{Handler, HandlerRegistry};
use crate::relay::{RelayPacket, RelaySink};
use crate::settings::{InputSettings, Millis};

/// Priority of the internal edge-signal subscriptions
pub const SIGNAL_PRIORITY: i32 = 16;

/// Collaborators a button is wired to at construction
#[derive(Clone)]
pub struct ButtonWiring {
    pub bus: Rc<dyn EventBus>,
    pub settings: Rc<InputSettings>,
    pub relay: Option<Rc<dyn RelaySink>>,
    /// Connection flag of the owning controller
    pub owner: Option<Weak<Cell<bool>>>,
}

impl ButtonWiring {
    pub fn new(bus: Rc<dyn EventBus>, settings: Rc<InputSettings>) -> Self {
        Self {
            bus,
            settings,
            relay: None,
            owner: None,
        }
    }

    pub fn with_relay(mut self, relay: Rc<dyn RelaySink>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn with_owner(mut self, connected: &Rc<Cell<bool>>) -> Self {
        self.owner = Some(Rc::downgrade(connected));
        self
    }
}

pub struct Button {
    id: ButtonId,
    wiring: ButtonWiring,
    pressed: Cell<bool>,
    elapsed_since_press: Cell<Millis>,
    repeat_count: Cell<i64>,
    repeat_delay: Cell<Option<Millis>>,
    repeat_interval: Cell<Option<Millis>>,
    handlers: RefCell<Option<HandlerRegistry>>,
    this: Weak<Button>,
}

impl Button {
    /// Creates a button and, for real ids, subscribes it to its edge signals
    ///
    /// The wildcard button is never wired to a signal.
    pub fn new(id: ButtonId, wiring: ButtonWiring) -> Rc<Self> {
        let button = Rc::new_cyclic(|this| Self {
            id,
            wiring,
            pressed: Cell::new(false),
            elapsed_since_press: Cell::new(0),
            repeat_count: Cell::new(0),
            repeat_delay: Cell::new(None),
            repeat_interval: Cell::new(None),
            handlers: RefCell::new(None),
            this: this.clone(),
        });

        if !id.is_wildcard() {
            button.listen_for_signal(RawKey::InternalUp, false);
            button.listen_for_signal(RawKey::InternalDown, true);
        }

        button
    }

    fn listen_for_signal(&self, key: RawKey, pressed: bool) {
        let this = self.this.clone();
        self.wiring.bus.subscribe(
            key.code(),
            self.id.source(),
            SIGNAL_PRIORITY,
            Rc::new(move |_| {
                if let Some(button) = this.upgrade() {
                    button.set_pressed(pressed);
                }
            }),
        );
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    /// Indicates if the button is currently pressed
    pub fn is_pressed(&self) -> bool {
        self.pressed.get()
    }

    pub fn elapsed_since_press(&self) -> Millis {
        self.elapsed_since_press.get()
    }

    pub fn repeat_count(&self) -> i64 {
        self.repeat_count.get()
    }

    pub fn repeat_delay(&self) -> Option<Millis> {
        self.repeat_delay.get()
    }

    /// Per-button delay before repeats start; `None` follows the global default
    pub fn set_repeat_delay(&self, delay: Option<Millis>) {
        self.repeat_delay.set(delay);
    }

    pub fn repeat_interval(&self) -> Option<Millis> {
        self.repeat_interval.get()
    }

    /// Per-button repeat interval; `None` follows the global default
    pub fn set_repeat_interval(&self, interval: Option<Millis>) {
        self.repeat_interval.set(interval);
    }

    fn set_pressed(&self, pressed: bool) {
        if self.pressed.get() == pressed {
            return;
        }

        if let Some(connected) = self.wiring.owner.as_ref().and_then(Weak::upgrade) {
            connected.set(true);
        }
        self.pressed.set(pressed);
        debug!(button = %self.id, pressed, "Button state changed");

        if pressed {
            self.elapsed_since_press.set(0);
            self.raise_button_down(false);
        } else {
            self.repeat_count.set(0);
            self.raise_button_up(false);
        }
    }

    /// Raises the button-up event, locally or over the relay
    pub fn raise_button_up(&self, relay: bool) {
        self.raise(ButtonEvent::Released, relay);
    }

    /// Raises the button-down event, locally or over the relay
    pub fn raise_button_down(&self, relay: bool) {
        self.raise(ButtonEvent::Pressed, relay);
    }

    fn raise_button_repeat(&self, relay: bool) {
        self.raise(ButtonEvent::Repeated, relay);
    }

    fn raise(&self, event: ButtonEvent, relay: bool) {
        let key = RawKey::for_event(event, self.wiring.settings.namespace());

        if !relay {
            trace!(button = %self.id, key = key.value(), "Raise local");
            self.wiring.bus.raise(key.code(), self.id.source());
            return;
        }

        match &self.wiring.relay {
            Some(sink) => sink.send(RelayPacket::button_event(key, self.id)),
            None => warn!(button = %self.id, ?event, "No relay link, event dropped"),
        }
    }

    /// Advances the repeat timer by `dt` milliseconds
    ///
    /// Fires at most one repeat per call, and only when the computed repeat
    /// count differs from the last one. Counts skipped by a large `dt` are
    /// not replayed.
    pub fn update(&self, dt: Millis) {
        if !self.pressed.get() {
            return;
        }

        let elapsed = self.elapsed_since_press.get().saturating_add(dt);
        self.elapsed_since_press.set(elapsed);

        let settings = &self.wiring.settings;
        let delay = self
            .repeat_delay
            .get()
            .unwrap_or_else(|| settings.repeat_delay());
        let interval = self
            .repeat_interval
            .get()
            .unwrap_or_else(|| settings.repeat_interval());

        // initial hold window
        if elapsed < delay {
            return;
        }

        let count = repeat_count_at(elapsed, delay, interval, self.repeat_count.get());
        if count != self.repeat_count.get() {
            self.repeat_count.set(count);
            self.raise_button_repeat(false);
        }
    }

    /// Sets the user handler for `event`, replacing any previous one
    pub fn on_event(&self, event: ButtonEvent, handler: Handler) {
        self.register_or_get(event);
        if let Some(registry) = self.handlers.borrow_mut().as_mut() {
            registry.set_user(event, handler);
        }
    }

    /// Adds a system handler that does not conflict with [`Button::on_event`]
    ///
    /// Adding the same handler for the same event twice has no effect.
    pub fn add_event_listener(&self, event: ButtonEvent, handler: Handler) {
        self.register_or_get(event);
        if let Some(registry) = self.handlers.borrow_mut().as_mut() {
            registry.add_system(event, handler);
        }
    }

    /// Removes a handler registered with [`Button::add_event_listener`]
    pub fn remove_event_listener(&self, event: ButtonEvent, handler: &Handler) {
        if let Some(registry) = self.handlers.borrow_mut().as_mut() {
            registry.remove_system(event, handler);
        }
    }

    /// Number of system handlers registered for `event`
    pub fn listener_count(&self, event: ButtonEvent) -> usize {
        self.handlers
            .borrow()
            .as_ref()
            .map_or(0, |registry| registry.system_len_for(event))
    }

    /// Creates the registry and user slot for `event` on first use, and with
    /// them the one bus subscription that dispatches `event` for this button
    fn register_or_get(&self, event: ButtonEvent) {
        let created = self
            .handlers
            .borrow_mut()
            .get_or_insert_with(HandlerRegistry::new)
            .ensure_slot(event);
        if !created {
            return;
        }

        let key = RawKey::for_event(event, Namespace::User);
        let this = self.this.clone();
        self.wiring.bus.subscribe(
            key.code(),
            self.id.source(),
            DEFAULT_PRIORITY,
            Rc::new(move |_| {
                if let Some(button) = this.upgrade() {
                    button.dispatch(event);
                }
            }),
        );
        trace!(button = %self.id, ?event, "Dispatch subscription created");
    }

    fn dispatch(&self, event: ButtonEvent) {
        let handlers = match self.handlers.borrow().as_ref() {
            Some(registry) => registry.snapshot(event),
            None => return,
        };
        trace!(button = %self.id, ?event, handlers = handlers.len(), "Dispatch");

        for handler in handlers {
            handler();
        }
    }

    /// Completes when this button next raises `event` in the user band
    pub fn pause_until(&self, event: ButtonEvent) -> EventWait {
        let key = RawKey::for_event(event, Namespace::User);
        self.wiring.bus.wait_for(key.code(), self.id.source())
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_pressed() { "down" } else { "up" };
        write!(f, "btn {} {}", self.id, state)
    }
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("id", &self.id)
            .field("pressed", &self.pressed.get())
            .field("elapsed_since_press", &self.elapsed_since_press.get())
            .field("repeat_count", &self.repeat_count.get())
            .finish_non_exhaustive()
    }
}

/// Repeat count for a button held `elapsed` ms
///
/// `floor((elapsed - delay - interval) / interval)`, held at 0 until the first
/// full interval after the delay has passed. A non-positive interval has no
/// meaningful count, so every call past the delay yields a new one.
fn repeat_count_at(elapsed: Millis, delay: Millis, interval: Millis, previous: i64) -> i64 {
    if interval <= 0 {
        return previous.wrapping_add(1);
    }
    // i128 so extreme delays or a saturated elapsed time cannot overflow
    let count = (i128::from(elapsed) - i128::from(delay) - i128::from(interval))
        .div_euclid(i128::from(interval))
        .max(0);
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::bus::{BusEvent, LocalBus};
    use crate::keys::{EventCode, SourceId};
    use crate::relay::QueuedRelay;

    struct Rig {
        bus: Rc<LocalBus>,
        settings: Rc<InputSettings>,
        relay: Rc<QueuedRelay>,
        raised: Rc<RefCell<Vec<(u16, u16)>>>,
    }

    impl Rig {
        fn new() -> Self {
            let bus = LocalBus::shared();
            let raised = Rc::new(RefCell::new(Vec::new()));
            for key in RawKey::ALL {
                if matches!(key, RawKey::InternalUp | RawKey::InternalDown) {
                    continue;
                }
                let raised = Rc::clone(&raised);
                bus.subscribe(
                    key.code(),
                    SourceId::ANY,
                    DEFAULT_PRIORITY,
                    Rc::new(move |event: BusEvent| {
                        raised.borrow_mut().push((event.code.0, event.source.0))
                    }),
                );
            }
            Self {
                bus,
                settings: InputSettings::default().shared(),
                relay: Rc::new(QueuedRelay::new()),
                raised,
            }
        }

        fn button(&self, id: ButtonId) -> Rc<Button> {
            let wiring = ButtonWiring::new(self.bus.clone(), Rc::clone(&self.settings))
                .with_relay(self.relay.clone());
            Button::new(id, wiring)
        }

        fn signal(&self, id: ButtonId, pressed: bool) {
            let key = if pressed {
                RawKey::InternalDown
            } else {
                RawKey::InternalUp
            };
            self.bus.raise(key.code(), id.source());
        }

        fn raised_keys(&self) -> Vec<u16> {
            self.raised.borrow().iter().map(|(code, _)| *code).collect()
        }

        fn repeats(&self) -> usize {
            self.raised
                .borrow()
                .iter()
                .filter(|(code, _)| *code == RawKey::UserRepeat.value())
                .count()
        }
    }

    fn counter() -> (Rc<Cell<u32>>, Handler) {
        let count = Rc::new(Cell::new(0));
        let inner = Rc::clone(&count);
        (count, Rc::new(move || inner.set(inner.get() + 1)))
    }

    #[test]
    fn test_press_release_signals_are_idempotent() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::A);

        rig.signal(ButtonId::A, true);
        rig.signal(ButtonId::A, true);
        assert!(button.is_pressed());
        assert_eq!(rig.raised_keys(), vec![RawKey::UserDown.value()]);

        rig.signal(ButtonId::A, false);
        rig.signal(ButtonId::A, false);
        assert!(!button.is_pressed());
        assert_eq!(
            rig.raised_keys(),
            vec![RawKey::UserDown.value(), RawKey::UserUp.value()]
        );
    }

    #[test]
    fn test_signals_are_scoped_to_button_id() {
        let rig = Rig::new();
        let a = rig.button(ButtonId::A);
        let b = rig.button(ButtonId::B);

        rig.signal(ButtonId::B, true);
        assert!(!a.is_pressed());
        assert!(b.is_pressed());
        assert_eq!(*rig.raised.borrow(), vec![(RawKey::UserDown.value(), 6)]);
    }

    #[test]
    fn test_press_resets_elapsed_release_resets_count() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::LEFT);

        for _ in 0..2 {
            rig.signal(ButtonId::LEFT, true);
            assert_eq!(button.elapsed_since_press(), 0);
            for _ in 0..70 {
                button.update(10);
            }
            assert_eq!(button.elapsed_since_press(), 700);
            assert!(button.repeat_count() > 0);

            rig.signal(ButtonId::LEFT, false);
            assert_eq!(button.repeat_count(), 0);
        }
    }

    #[test]
    fn test_repeat_timing_with_default_delay_and_interval() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::UP);
        rig.signal(ButtonId::UP, true);

        let mut fired_at = Vec::new();
        for step in 1..=62 {
            let before = rig.repeats();
            button.update(10);
            if rig.repeats() > before {
                fired_at.push(step * 10);
            }
        }

        assert_eq!(fired_at, vec![560, 590, 620]);
        assert_eq!(button.repeat_count(), 3);
    }

    #[test]
    fn test_no_repeat_when_released() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::UP);
        for _ in 0..100 {
            button.update(10);
        }
        assert_eq!(button.elapsed_since_press(), 0);
        assert_eq!(rig.repeats(), 0);
    }

    #[test]
    fn test_large_tick_fires_single_repeat() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::DOWN);
        rig.signal(ButtonId::DOWN, true);

        button.update(1000);
        assert_eq!(rig.repeats(), 1);
        assert_eq!(button.repeat_count(), 15);

        button.update(5);
        assert_eq!(rig.repeats(), 1);
    }

    #[test]
    fn test_instance_overrides_global_defaults() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::RIGHT);
        button.set_repeat_delay(Some(100));
        button.set_repeat_interval(Some(50));
        rig.signal(ButtonId::RIGHT, true);

        button.update(190);
        assert_eq!(rig.repeats(), 0);
        button.update(10);
        assert_eq!(rig.repeats(), 1);

        // Global change does not affect the overridden button
        rig.settings.set_repeat_default(10_000, 10_000);
        button.update(50);
        assert_eq!(rig.repeats(), 2);
    }

    #[test]
    fn test_degenerate_interval_repeats_every_tick() {
        let rig = Rig::new();
        rig.settings.set_repeat_default(0, 0);
        let button = rig.button(ButtonId::A);
        rig.signal(ButtonId::A, true);

        for _ in 0..5 {
            button.update(1);
        }
        assert_eq!(rig.repeats(), 5);
    }

    #[test]
    fn test_extreme_timings_do_not_overflow() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::A);

        rig.settings.set_repeat_default(Millis::MIN, 30);
        rig.signal(ButtonId::A, true);
        button.update(10);
        assert_eq!(rig.repeats(), 1);
        rig.signal(ButtonId::A, false);

        rig.settings.set_repeat_default(-1, 30);
        rig.signal(ButtonId::A, true);
        button.update(Millis::MAX);
        assert_eq!(button.elapsed_since_press(), Millis::MAX);
        assert_eq!(rig.repeats(), 2);

        // saturated elapsed time stays put, so the count no longer changes
        button.update(Millis::MAX);
        assert_eq!(rig.repeats(), 2);
    }

    #[test]
    fn test_repeat_count_at_extremes() {
        assert_eq!(repeat_count_at(10, Millis::MIN, 30, 0), (i64::MAX - 19) / 30);
        assert_eq!(repeat_count_at(Millis::MAX, -1, 30, 0), (i64::MAX - 29) / 30);
        assert_eq!(repeat_count_at(Millis::MIN, Millis::MAX, 1, 0), 0);
        assert_eq!(repeat_count_at(0, 0, 0, i64::MAX), i64::MIN);
    }

    #[test]
    fn test_user_handler_last_write_wins_system_unaffected() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::A);
        let (first, first_handler) = counter();
        let (second, second_handler) = counter();
        let (system, system_handler) = counter();

        button.add_event_listener(ButtonEvent::Pressed, system_handler);
        button.on_event(ButtonEvent::Pressed, first_handler);
        button.on_event(ButtonEvent::Pressed, second_handler);

        rig.signal(ButtonId::A, true);
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
        assert_eq!(system.get(), 1);
    }

    #[test]
    fn test_one_dispatch_subscription_per_event_kind() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::B);
        let source = ButtonId::B.source();
        let code = RawKey::UserDown.code();

        let (_, a) = counter();
        let (_, b) = counter();
        button.on_event(ButtonEvent::Pressed, Rc::clone(&a));
        button.on_event(ButtonEvent::Pressed, b);
        button.add_event_listener(ButtonEvent::Pressed, Rc::clone(&a));
        button.remove_event_listener(ButtonEvent::Pressed, &a);

        assert_eq!(rig.bus.subscriptions_for(code, source), 1);
        assert_eq!(
            rig.bus.subscriptions_for(RawKey::UserUp.code(), source),
            0
        );
    }

    #[test]
    fn test_listener_add_twice_remove_once() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::B);
        let (count, handler) = counter();

        button.add_event_listener(ButtonEvent::Released, Rc::clone(&handler));
        button.add_event_listener(ButtonEvent::Released, Rc::clone(&handler));
        assert_eq!(button.listener_count(ButtonEvent::Released), 1);

        rig.signal(ButtonId::B, true);
        rig.signal(ButtonId::B, false);
        assert_eq!(count.get(), 1);

        button.remove_event_listener(ButtonEvent::Released, &handler);
        button.remove_event_listener(ButtonEvent::Released, &handler);
        assert_eq!(button.listener_count(ButtonEvent::Released), 0);

        rig.signal(ButtonId::B, true);
        rig.signal(ButtonId::B, false);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_remove_without_registry_is_noop() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::B);
        let (_, handler) = counter();
        button.remove_event_listener(ButtonEvent::Pressed, &handler);
        assert_eq!(button.listener_count(ButtonEvent::Pressed), 0);
    }

    #[test]
    fn test_handler_removing_itself_during_dispatch() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::A);
        let log = Rc::new(RefCell::new(Vec::new()));

        let slot: Rc<RefCell<Option<Handler>>> = Rc::new(RefCell::new(None));
        let once: Handler = {
            let button = Rc::downgrade(&button);
            let slot = Rc::clone(&slot);
            let log = Rc::clone(&log);
            Rc::new(move || {
                log.borrow_mut().push("once");
                if let (Some(button), Some(me)) = (button.upgrade(), slot.borrow().clone()) {
                    button.remove_event_listener(ButtonEvent::Pressed, &me);
                }
            })
        };
        *slot.borrow_mut() = Some(Rc::clone(&once));

        let after: Handler = {
            let log = Rc::clone(&log);
            Rc::new(move || log.borrow_mut().push("after"))
        };

        button.add_event_listener(ButtonEvent::Pressed, once);
        button.add_event_listener(ButtonEvent::Pressed, after);

        rig.signal(ButtonId::A, true);
        rig.signal(ButtonId::A, false);
        rig.signal(ButtonId::A, true);

        assert_eq!(*log.borrow(), vec!["once", "after", "after"]);
    }

    #[test]
    fn test_handler_swapping_user_slot_during_dispatch() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::A);
        let (replacement_count, replacement) = counter();
        let (first_count, first) = counter();

        let swap: Handler = {
            let button = Rc::downgrade(&button);
            Rc::new(move || {
                first();
                if let Some(button) = button.upgrade() {
                    button.on_event(ButtonEvent::Pressed, Rc::clone(&replacement));
                }
            })
        };
        button.on_event(ButtonEvent::Pressed, swap);

        rig.signal(ButtonId::A, true);
        assert_eq!(first_count.get(), 1);
        assert_eq!(replacement_count.get(), 0);

        rig.signal(ButtonId::A, false);
        rig.signal(ButtonId::A, true);
        assert_eq!(first_count.get(), 1);
        assert_eq!(replacement_count.get(), 1);
    }

    #[test]
    fn test_system_namespace_changes_key_only() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::A);
        let (count, handler) = counter();
        button.on_event(ButtonEvent::Pressed, handler);

        rig.settings.set_user_events_enabled(false);
        rig.signal(ButtonId::A, true);
        assert!(button.is_pressed());
        assert_eq!(rig.raised_keys(), vec![RawKey::SystemDown.value()]);
        // Handlers listen on the user band
        assert_eq!(count.get(), 0);

        rig.signal(ButtonId::A, false);
        rig.settings.set_user_events_enabled(true);
        rig.signal(ButtonId::A, true);
        assert_eq!(count.get(), 1);
        assert_eq!(
            rig.raised_keys(),
            vec![
                RawKey::SystemDown.value(),
                RawKey::SystemUp.value(),
                RawKey::UserDown.value()
            ]
        );
    }

    #[test]
    fn test_relay_raise_skips_local_bus() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::B);
        let (count, handler) = counter();
        button.on_event(ButtonEvent::Pressed, handler);

        button.raise_button_down(true);
        rig.settings.set_user_events_enabled(false);
        button.raise_button_up(true);

        assert!(rig.raised_keys().is_empty());
        assert_eq!(count.get(), 0);
        let packets: Vec<[u8; 4]> = rig.relay.drain().iter().map(|p| p.encode()).collect();
        assert_eq!(packets, vec![[1, 0x01, 0x08, 6], [1, 0x04, 0x08, 6]]);
    }

    #[test]
    fn test_local_raise_does_not_change_pressed() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::B);
        button.raise_button_down(false);
        assert!(!button.is_pressed());
        assert_eq!(rig.raised_keys(), vec![RawKey::UserDown.value()]);
    }

    #[test]
    fn test_wildcard_ignores_signals_and_aggregates_events() {
        let rig = Rig::new();
        let any = rig.button(ButtonId::Wildcard);
        let _a = rig.button(ButtonId::A);
        let _left = rig.button(ButtonId::LEFT);
        let (count, handler) = counter();
        any.on_event(ButtonEvent::Pressed, handler);

        rig.signal(ButtonId::Wildcard, true);
        assert!(!any.is_pressed());
        assert_eq!(count.get(), 0);

        rig.signal(ButtonId::A, true);
        rig.signal(ButtonId::LEFT, true);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_pause_until_completes_on_event() {
        use futures::FutureExt;

        let rig = Rig::new();
        let button = rig.button(ButtonId::A);
        let mut wait = button.pause_until(ButtonEvent::Released);

        rig.signal(ButtonId::A, true);
        assert!((&mut wait).now_or_never().is_none());

        rig.signal(ButtonId::A, false);
        let event = wait.now_or_never().expect("released event delivered");
        assert_eq!(event.code, EventCode(RawKey::UserUp.value()));
        assert_eq!(event.source, SourceId(5));
    }

    #[test]
    fn test_display() {
        let rig = Rig::new();
        let button = rig.button(ButtonId::A);
        assert_eq!(button.to_string(), "btn 5 up");
        rig.signal(ButtonId::A, true);
        assert_eq!(button.to_string(), "btn 5 down");
    }

    #[test]
    fn test_owner_flag_set_on_first_signal() {
        let rig = Rig::new();
        let connected = Rc::new(Cell::new(false));
        let wiring =
            ButtonWiring::new(rig.bus.clone(), Rc::clone(&rig.settings)).with_owner(&connected);
        let _button = Button::new(ButtonId::MENU, wiring);

        assert!(!connected.get());
        rig.signal(ButtonId::MENU, true);
        assert!(connected.get());
    }

    #[test]
    fn test_repeat_count_arithmetic() {
        assert_eq!(repeat_count_at(500, 500, 30, 0), 0);
        assert_eq!(repeat_count_at(550, 500, 30, 0), 0);
        assert_eq!(repeat_count_at(560, 500, 30, 0), 1);
        assert_eq!(repeat_count_at(600, 500, 30, 1), 2);
        assert_eq!(repeat_count_at(10, 0, -5, 7), 8);
    }
}
