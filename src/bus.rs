//! Publish/subscribe event bus keyed by (event code, source id)
//!
//! Buttons consume the bus through the [`EventBus`] trait; [`LocalBus`] is the
//! single-threaded implementation used on the device and in the simulator.
//!
//! # Delivery
//!
//! ```text
//! raise(code, source)
//!        ↓
//!  matching subscriptions (exact source, or SourceId::ANY)
//!        ↓  snapshot, priority order (highest first)
//!  handlers run synchronously on the caller's thread
//!        ↓
//!  pending waits for (code, source) complete
//! ```

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use tracing::trace;

use crate::keys::{EventCode, SourceId};

/// An event as delivered to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusEvent {
    pub code: EventCode,
    pub source: SourceId,
}

/// Callback registered on the bus
pub type BusHandler = Rc<dyn Fn(BusEvent)>;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Priority used when a subscriber has no particular ordering needs
pub const DEFAULT_PRIORITY: i32 = 0;

/// Event bus primitive consumed by buttons and the controller
pub trait EventBus {
    /// Registers `handler` for `code` raised on `source`
    ///
    /// Subscribing on [`SourceId::ANY`] receives the code from every source.
    /// Handlers with a higher priority run first; equal priorities run in
    /// registration order.
    fn subscribe(
        &self,
        code: EventCode,
        source: SourceId,
        priority: i32,
        handler: BusHandler,
    ) -> SubscriptionId;

    /// Delivers an event synchronously to every matching subscriber
    fn raise(&self, code: EventCode, source: SourceId);

    /// Returns a future that completes the next time `(code, source)` is raised
    ///
    /// The wait is registered immediately, not on first poll. There is no
    /// timeout: if the event never arrives the future never completes.
    fn wait_for(&self, code: EventCode, source: SourceId) -> EventWait;
}

/// Pending cooperative wait on the bus
#[must_use = "an EventWait does nothing unless awaited"]
pub struct EventWait {
    receiver: oneshot::Receiver<BusEvent>,
}

impl Future for EventWait {
    type Output = BusEvent;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<BusEvent> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(event)) => Poll::Ready(event),
            // Bus dropped: the event can no longer arrive.
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Pending,
            Poll::Pending => Poll::Pending,
        }
    }
}

struct Subscription {
    id: SubscriptionId,
    code: EventCode,
    source: SourceId,
    priority: i32,
    handler: BusHandler,
}

impl Subscription {
    fn matches(&self, code: EventCode, source: SourceId) -> bool {
        self.code == code && (self.source == SourceId::ANY || self.source == source)
    }
}

struct Waiter {
    code: EventCode,
    source: SourceId,
    sender: oneshot::Sender<BusEvent>,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    /// Sorted by priority (highest first), stable within a priority
    subscriptions: Vec<Subscription>,
    waiters: Vec<Waiter>,
}

/// Single-threaded in-process event bus
///
/// Handlers may subscribe, raise and wait re-entrantly: `raise` snapshots the
/// matching handlers before running any of them.
#[derive(Default)]
pub struct LocalBus {
    state: RefCell<BusState>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus ready to be shared between buttons
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.state.borrow().subscriptions.len()
    }

    /// Number of subscriptions for an exact (code, source) pair
    pub fn subscriptions_for(&self, code: EventCode, source: SourceId) -> usize {
        self.state
            .borrow()
            .subscriptions
            .iter()
            .filter(|sub| sub.code == code && sub.source == source)
            .count()
    }

    /// Number of waits not yet completed
    pub fn pending_waits(&self) -> usize {
        self.state
            .borrow()
            .waiters
            .iter()
            .filter(|waiter| !waiter.sender.is_canceled())
            .count()
    }
}

impl EventBus for LocalBus {
    fn subscribe(
        &self,
        code: EventCode,
        source: SourceId,
        priority: i32,
        handler: BusHandler,
    ) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;

        state.subscriptions.push(Subscription {
            id,
            code,
            source,
            priority,
            handler,
        });
        state
            .subscriptions
            .sort_by_key(|sub| std::cmp::Reverse(sub.priority));

        trace!(code = code.0, source = source.0, priority, ?id, "Subscribed");
        id
    }

    fn raise(&self, code: EventCode, source: SourceId) {
        let event = BusEvent { code, source };

        let (handlers, ready) = {
            let mut state = self.state.borrow_mut();
            let handlers: Vec<BusHandler> = state
                .subscriptions
                .iter()
                .filter(|sub| sub.matches(code, source))
                .map(|sub| Rc::clone(&sub.handler))
                .collect();

            let (ready, pending): (Vec<Waiter>, Vec<Waiter>) = state
                .waiters
                .drain(..)
                .partition(|waiter| {
                    waiter.code == code
                        && (waiter.source == SourceId::ANY || waiter.source == source)
                });
            state.waiters = pending;

            (handlers, ready)
        };

        trace!(
            code = code.0,
            source = source.0,
            handlers = handlers.len(),
            waiters = ready.len(),
            "Raise"
        );

        for handler in handlers {
            handler(event);
        }

        for waiter in ready {
            // A dropped EventWait means nobody is listening any more.
            let _ = waiter.sender.send(event);
        }
    }

    fn wait_for(&self, code: EventCode, source: SourceId) -> EventWait {
        let (sender, receiver) = oneshot::channel();
        let mut state = self.state.borrow_mut();
        state.waiters.retain(|waiter| !waiter.sender.is_canceled());
        state.waiters.push(Waiter {
            code,
            source,
            sender,
        });
        EventWait { receiver }
    }
}
