//! mkit-core
//!
//! Client-side façade for long-lived measurement tasks run by an external
//! engine (speed tests, reachability checks, ...).
//!
//! # Modules
//! - **domain**: settings document, verbosity, task catalogue, event payloads
//! - **ports**: the engine boundary (`TaskEngine`, `EngineTask`, `EngineEvent`)
//! - **typed**: typed observers and the kind -> observers table
//! - **app**: `TaskBuilder`, `EventDispatcher`, handle guards, profiles
//! - **impls**: `ScriptedEngine`
//! - **error**: `TaskError`, `ProtocolViolation`, `StartupError`

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod typed;

pub use app::{RunState, TaskBuilder, TaskBuilderExt, TaskProfile};
pub use domain::task_kind::{
    CaptivePortal, Dash, DnsInjection, FacebookMessenger, HttpHeaderFieldManipulation,
    HttpInvalidRequestLine, MeekFrontedRequests, MultiNdt, Ndt, TcpConnect, Telegram,
    WebConnectivity, Whatsapp,
};
pub use domain::{Event, EventKind, LogLevel, Scalar, Settings, TaskKind};
pub use error::{ProtocolViolation, StartupError, TaskError};
pub use ports::{EngineEvent, EngineTask, TaskEngine};
