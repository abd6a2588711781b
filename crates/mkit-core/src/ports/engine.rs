//! TaskEngine port - start a task, wait for its events.
//!
//! # Contract
//! - `start` takes the serialized settings document and may run the task
//!   in the background.
//! - `wait_for_next_event` blocks until the next event. It must return
//!   `Some` while the task is not done; `None` there is a protocol violation.
//! - `serialize` renders one event as `{"key": ..., "value": {...}}`.
//! - `destroy` releases the engine-side resource. It must be idempotent;
//!   the dispatcher calls it exactly once per handle through a drop guard.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StartupError;

/// TaskEngine starts one task per settings document.
///
/// `start` returning `Err` is not a failure of `run()`: the reason reaches
/// `failure.startup` observers instead.
///
/// # Example
/// ```ignore
/// struct Refusing;
///
/// impl TaskEngine for Refusing {
///     type Task = ScriptedTask;
///
///     fn start(&self, _settings: &str) -> Result<ScriptedTask, StartupError> {
///         Err(StartupError::new("engine offline"))
///     }
/// }
///
/// // Shared engines work through the `&E` and `Arc<E>` impls.
/// let engine = Arc::new(ScriptedEngine::new([r#"{"key":"task_terminated"}"#]));
/// Ndt::builder(engine.clone()).run().await?;
/// ```
pub trait TaskEngine: Send + Sync {
    type Task: EngineTask;

    fn start(&self, settings: &str) -> Result<Self::Task, StartupError>;
}

/// EngineTask is one running task as seen from the dispatcher.
///
/// The dispatcher only ever calls `is_done` between waits, never to poll.
///
/// # Example
/// ```ignore
/// struct Once(Option<String>);
///
/// #[async_trait]
/// impl EngineTask for Once {
///     type Event = RawEvent;
///
///     fn is_done(&self) -> bool {
///         self.0.is_none()
///     }
///
///     async fn wait_for_next_event(&mut self) -> Option<RawEvent> {
///         self.0.take().map(RawEvent)
///     }
/// }
/// ```
#[async_trait]
pub trait EngineTask: Send {
    type Event: EngineEvent;

    /// Non-blocking completion probe.
    fn is_done(&self) -> bool;

    /// The only suspension point of a run.
    async fn wait_for_next_event(&mut self) -> Option<Self::Event>;

    fn destroy(&mut self) {}
}

pub trait EngineEvent: Send {
    fn serialize(&self) -> String;

    fn destroy(&mut self) {}
}

impl<E: TaskEngine + ?Sized> TaskEngine for Arc<E> {
    type Task = E::Task;

    fn start(&self, settings: &str) -> Result<Self::Task, StartupError> {
        (**self).start(settings)
    }
}

impl<E: TaskEngine + ?Sized> TaskEngine for &E {
    type Task = E::Task;

    fn start(&self, settings: &str) -> Result<Self::Task, StartupError> {
        (**self).start(settings)
    }
}
