//! Domain model: settings document, verbosity scale, task catalogue, events.

pub mod events;
pub mod settings;
pub mod task_kind;
pub mod verbosity;

pub use self::events::{Decoded, Event, EventKind, EventPayload, TERMINATED_KEY, UnhandledEvent};
pub use self::settings::{Scalar, Settings};
pub use self::task_kind::{
    InputCapability, Inputless, TaskDescriptor, TaskKind, UnknownTaskKind, WithInput,
};
pub use self::verbosity::{LogLevel, Verbosity};
