//! Impls - engine implementations that live in this crate.
//!
//! # Included
//! - **ScriptedEngine**: replays serialized events (tests, `--replay`)
//!
//! Bindings to a native measurement engine implement `ports::TaskEngine`
//! in their own crate.

pub mod scripted;

pub use self::scripted::{ScriptProbe, ScriptedEngine, ScriptedEvent, ScriptedTask};
