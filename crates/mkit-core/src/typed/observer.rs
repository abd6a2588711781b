//! Observer - caller callbacks for one event kind.
//!
//! `TypedObserver<P, F, R>` erases a typed closure into `dyn DynObserver`
//! so that observers of every kind share one table.

use std::marker::PhantomData;

use crate::domain::events::{Event, EventKind, EventPayload};
use crate::error::BoxError;

/// What an observer closure may return: `()` or `Result<(), E>`.
pub trait ObserverResult {
    fn into_result(self) -> Result<(), BoxError>;
}

impl ObserverResult for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> ObserverResult for Result<(), E> {
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// Object-safe observer.
pub trait DynObserver: Send {
    fn kind(&self) -> EventKind;

    /// Events of another kind are ignored.
    fn observe(&mut self, event: &Event) -> Result<(), BoxError>;
}

pub struct TypedObserver<P, F, R> {
    f: F,
    _marker: PhantomData<fn(&P) -> R>,
}

impl<P, F, R> TypedObserver<P, F, R>
where
    P: EventPayload,
    F: FnMut(&P) -> R + Send,
    R: ObserverResult,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<P, F, R> DynObserver for TypedObserver<P, F, R>
where
    P: EventPayload,
    F: FnMut(&P) -> R + Send,
    R: ObserverResult,
{
    fn kind(&self) -> EventKind {
        P::KIND
    }

    fn observe(&mut self, event: &Event) -> Result<(), BoxError> {
        match P::from_event(event) {
            Some(payload) => (self.f)(payload).into_result(),
            None => Ok(()),
        }
    }
}
