//! Event vocabulary shared by buttons, the bus and the relay
//!
//! Logical events ([`ButtonEvent`]) are what handlers subscribe to. Raw keys
//! ([`RawKey`]) are the literal constants that travel on the bus and over the
//! relay. The two are joined by exactly one table, [`RawKey::for_event`].

use std::fmt;
use std::num::NonZeroU8;

/// Key posted on the event bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventCode(pub u16);

/// Scope of a bus event (a button id, or 0 for controller-wide events)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u16);

impl SourceId {
    /// Subscribing on this source receives the event from every source
    pub const ANY: SourceId = SourceId(0);
}

/// Logical button event kind observed by handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonEvent {
    Pressed,
    Released,
    Repeated,
}

impl ButtonEvent {
    pub const ALL: [ButtonEvent; 3] = [Self::Pressed, Self::Released, Self::Repeated];
}

/// Which band of raw keys a raise selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Keys user handlers are subscribed to
    User,
    /// Keys used while user events are suppressed (e.g. a system menu is open)
    System,
}

/// Stable raw key constants. Consumers match on these literal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RawKey {
    UserUp = 2048,
    UserDown = 2049,
    /// Edge notification from the signal source, released
    InternalUp = 2050,
    /// Edge notification from the signal source, pressed
    InternalDown = 2051,
    SystemUp = 2052,
    SystemDown = 2053,
    UserRepeat = 2054,
    SystemRepeat = 2055,
}

impl RawKey {
    pub const ALL: [RawKey; 8] = [
        Self::UserUp,
        Self::UserDown,
        Self::InternalUp,
        Self::InternalDown,
        Self::SystemUp,
        Self::SystemDown,
        Self::UserRepeat,
        Self::SystemRepeat,
    ];

    /// The raw key raised for a logical event in the given namespace
    pub const fn for_event(event: ButtonEvent, namespace: Namespace) -> RawKey {
        match (event, namespace) {
            (ButtonEvent::Pressed, Namespace::User) => Self::UserDown,
            (ButtonEvent::Released, Namespace::User) => Self::UserUp,
            (ButtonEvent::Repeated, Namespace::User) => Self::UserRepeat,
            (ButtonEvent::Pressed, Namespace::System) => Self::SystemDown,
            (ButtonEvent::Released, Namespace::System) => Self::SystemUp,
            (ButtonEvent::Repeated, Namespace::System) => Self::SystemRepeat,
        }
    }

    pub const fn value(self) -> u16 {
        self as u16
    }

    pub const fn code(self) -> EventCode {
        EventCode(self as u16)
    }

    pub fn from_value(value: u16) -> Option<RawKey> {
        Self::ALL.into_iter().find(|key| key.value() == value)
    }
}

impl From<RawKey> for EventCode {
    fn from(key: RawKey) -> Self {
        key.code()
    }
}

/// Controller-wide presence signal, raised on [`PRESENCE_SOURCE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PresenceEvent {
    Absent = 3042,
    Present = 3043,
}

impl PresenceEvent {
    pub const fn code(self) -> EventCode {
        EventCode(self as u16)
    }
}

/// Source id presence events are scoped to
pub const PRESENCE_SOURCE: SourceId = SourceId(0);

/// Identity of a button
///
/// `Wildcard` is never wired to a signal; subscriptions made through it
/// observe every real button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    /// A physical button; id 0 is reserved for the wildcard source
    Real(NonZeroU8),
    Wildcard,
}

impl ButtonId {
    pub const LEFT: ButtonId = ButtonId::from_number(1);
    pub const UP: ButtonId = ButtonId::from_number(2);
    pub const RIGHT: ButtonId = ButtonId::from_number(3);
    pub const DOWN: ButtonId = ButtonId::from_number(4);
    pub const A: ButtonId = ButtonId::from_number(5);
    pub const B: ButtonId = ButtonId::from_number(6);
    pub const MENU: ButtonId = ButtonId::from_number(7);

    /// Ids of all buttons wired on the controller, in declaration order
    pub const WIRED: [ButtonId; 7] = [
        Self::LEFT,
        Self::UP,
        Self::RIGHT,
        Self::DOWN,
        Self::A,
        Self::B,
        Self::MENU,
    ];

    /// Maps a wire id; 0 is the wildcard
    pub const fn from_number(id: u8) -> ButtonId {
        match NonZeroU8::new(id) {
            Some(id) => ButtonId::Real(id),
            None => ButtonId::Wildcard,
        }
    }

    pub fn is_wildcard(self) -> bool {
        matches!(self, ButtonId::Wildcard)
    }

    /// Numeric id as carried in relay packets (0 for the wildcard)
    pub fn number(self) -> u8 {
        match self {
            ButtonId::Real(id) => id.get(),
            ButtonId::Wildcard => 0,
        }
    }

    pub fn source(self) -> SourceId {
        SourceId(u16::from(self.number()))
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonId::Real(id) => write!(f, "{}", id),
            ButtonId::Wildcard => f.write_str("any"),
        }
    }
}
