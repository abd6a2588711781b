//! App - builder and run loop.
//!
//! # Components
//! - **TaskBuilder**: fluent settings + observer registration
//! - **EventDispatcher**: run() state machine (start, pump, dispatch, release)
//! - **TaskHandle / EventHandle**: drop guards around engine resources
//! - **TaskProfile**: file-backed configuration

pub mod builder;
pub mod dispatcher;
pub mod handles;
pub mod profile;

pub use self::builder::{TaskBuilder, TaskBuilderExt};
pub use self::dispatcher::{EventDispatcher, RunState};
pub use self::handles::{EventHandle, TaskHandle};
pub use self::profile::{ProfileError, TaskProfile};
