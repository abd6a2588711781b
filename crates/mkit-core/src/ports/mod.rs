//! Ports - the boundary with the measurement engine.
//!
//! The engine runs the actual measurement; this crate only starts it,
//! pumps its events and releases its handles.

pub mod engine;

pub use self::engine::{EngineEvent, EngineTask, TaskEngine};
