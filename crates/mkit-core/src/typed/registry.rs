//! ObserverRegistry - event kind -> ordered observers.
//!
//! - Filled before a run (append-only).
//! - Read during a run: observers of one kind fire in registration order.

use std::collections::HashMap;

use super::observer::{DynObserver, ObserverResult, TypedObserver};
use crate::domain::events::{Event, EventKind, EventPayload};
use crate::error::TaskError;

#[derive(Default)]
pub struct ObserverRegistry {
    observers: HashMap<EventKind, Vec<Box<dyn DynObserver>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
        }
    }

    pub fn register<P, F, R>(&mut self, f: F)
    where
        P: EventPayload,
        F: FnMut(&P) -> R + Send + 'static,
        R: ObserverResult + 'static,
    {
        self.register_dyn(Box::new(TypedObserver::<P, F, R>::new(f)));
    }

    pub fn register_dyn(&mut self, observer: Box<dyn DynObserver>) {
        self.observers
            .entry(observer.kind())
            .or_default()
            .push(observer);
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.observers.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.observers.values().all(Vec::is_empty)
    }

    /// Invoke every observer of `event.kind()` in order.
    ///
    /// Stops at the first observer error; later observers of the same event
    /// are not called.
    pub fn dispatch(&mut self, event: &Event) -> Result<(), TaskError> {
        let kind = event.kind();
        let Some(observers) = self.observers.get_mut(&kind) else {
            return Ok(());
        };
        for observer in observers.iter_mut() {
            observer
                .observe(event)
                .map_err(|source| TaskError::Observer { kind, source })?;
        }
        Ok(())
    }
}
