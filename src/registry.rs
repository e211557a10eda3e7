//! Per-button handler lists
//!
//! Each button keeps two independent lists:
//! - **user**: one slot per event kind, last registration wins
//! - **system**: ordered (kind, handler) pairs, idempotent add, explicit remove
//!
//! The registry only stores handlers. Wiring the bus subscription that
//! triggers dispatch is the owning button's job.

use std::rc::Rc;

use crate::keys::ButtonEvent;

/// Callback run when a button event is dispatched
pub type Handler = Rc<dyn Fn()>;

/// Handler identity is the allocation, not the closure's vtable
pub fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

struct UserSlot {
    event: ButtonEvent,
    handler: Option<Handler>,
}

#[derive(Default)]
pub struct HandlerRegistry {
    user: Vec<UserSlot>,
    system: Vec<(ButtonEvent, Handler)>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure a user slot exists for `event`
    ///
    /// Returns true when the slot was created by this call, which is the
    /// moment the owner must subscribe for dispatch.
    pub fn ensure_slot(&mut self, event: ButtonEvent) -> bool {
        if self.user.iter().any(|slot| slot.event == event) {
            return false;
        }
        self.user.push(UserSlot {
            event,
            handler: None,
        });
        true
    }

    /// Overwrites the user handler for `event`
    pub fn set_user(&mut self, event: ButtonEvent, handler: Handler) {
        self.ensure_slot(event);
        if let Some(slot) = self.user.iter_mut().find(|slot| slot.event == event) {
            slot.handler = Some(handler);
        }
    }

    pub fn user_handler(&self, event: ButtonEvent) -> Option<Handler> {
        self.user
            .iter()
            .find(|slot| slot.event == event)
            .and_then(|slot| slot.handler.clone())
    }

    /// Appends a system handler unless the identical pair is already present
    ///
    /// Returns false for a duplicate.
    pub fn add_system(&mut self, event: ButtonEvent, handler: Handler) -> bool {
        let exists = self
            .system
            .iter()
            .any(|(kind, existing)| *kind == event && same_handler(existing, &handler));
        if exists {
            return false;
        }
        self.system.push((event, handler));
        true
    }

    /// Removes the first exact (kind, handler) match
    ///
    /// Returns false when nothing matched.
    pub fn remove_system(&mut self, event: ButtonEvent, handler: &Handler) -> bool {
        let position = self
            .system
            .iter()
            .position(|(kind, existing)| *kind == event && same_handler(existing, handler));
        match position {
            Some(index) => {
                self.system.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn system_len(&self) -> usize {
        self.system.len()
    }

    pub fn system_len_for(&self, event: ButtonEvent) -> usize {
        self.system.iter().filter(|(kind, _)| *kind == event).count()
    }

    /// Handlers to run for `event`: the user handler, then system handlers in
    /// insertion order
    ///
    /// Returned as an owned list so callers can run it while the registry is
    /// being mutated by the handlers themselves.
    pub fn snapshot(&self, event: ButtonEvent) -> Vec<Handler> {
        self.user_handler(event)
            .into_iter()
            .chain(
                self.system
                    .iter()
                    .filter(|(kind, _)| *kind == event)
                    .map(|(_, handler)| Rc::clone(handler)),
            )
            .collect()
    }
}
