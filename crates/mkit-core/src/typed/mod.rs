//! Typed - typed observer API over the decoded event stream.
//!
//! # Two layers
//! - **Typed**: `FnMut(&P)` closures for a payload type `P: EventPayload`
//! - **Dyn**: `DynObserver`, object-safe, stored per `EventKind`

pub mod observer;
pub mod registry;

pub use self::observer::{DynObserver, ObserverResult, TypedObserver};
pub use self::registry::ObserverRegistry;
pub use crate::domain::events::EventPayload;
