//! EventDispatcher - start a task and pump its events to observers.
//!
//! # State machine
//! ```text
//! Idle -> Running -> Draining -> Terminated
//!   \________\__________\______-> Failed
//! ```
//! - `Idle -> Running`: only from `Idle`; any later `run()` is `AlreadyRunning`.
//! - `Running`: wait, decode, dispatch, until `task_terminated` or `is_done`.
//! - `Draining`: loop left normally, task handle being released.
//! - `Failed`: protocol violation or observer error. Handles are released
//!   on this path too.
//!
//! A dispatcher never leaves `Terminated` or `Failed`.

use tracing::{debug, error, trace, warn};

use super::handles::TaskHandle;
use crate::domain::events::{self, Decoded, Event, FailureStartup};
use crate::domain::settings::Settings;
use crate::error::{ProtocolViolation, TaskError};
use crate::ports::engine::{EngineTask, TaskEngine};
use crate::typed::ObserverRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Draining,
    Terminated,
    Failed,
}

#[derive(Default)]
pub struct EventDispatcher {
    registry: ObserverRegistry,
    state: RunState,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry_mut(&mut self) -> &mut ObserverRegistry {
        &mut self.registry
    }

    pub fn registry(&self) -> &ObserverRegistry {
        &self.registry
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run one task to completion.
    ///
    /// A startup refusal is delivered to `failure.startup` observers and
    /// returns `Ok(())`.
    pub async fn run<E: TaskEngine>(
        &mut self,
        engine: &E,
        settings: &Settings,
    ) -> Result<(), TaskError> {
        if self.state != RunState::Idle {
            return Err(TaskError::AlreadyRunning);
        }
        self.state = RunState::Running;
        debug!(
            task = settings.name(),
            log_level = settings.log_level().unwrap_or("-"),
            "starting task"
        );

        let task = match engine.start(&settings.to_json_string()) {
            Ok(task) => task,
            Err(e) => {
                warn!(task = settings.name(), reason = %e.reason, "engine refused to start task");
                let startup = Event::FailureStartup(FailureStartup { failure: e.reason });
                let result = self.registry.dispatch(&startup);
                self.finish(&result);
                return result;
            }
        };

        let mut task = TaskHandle::new(task);
        let result = self.pump(&mut task).await;
        task.release();
        self.finish(&result);
        result
    }

    async fn pump<T: EngineTask>(&mut self, task: &mut TaskHandle<T>) -> Result<(), TaskError> {
        while !task.is_done() {
            let Some(event) = task.next_event().await else {
                error!("engine returned no event for a running task");
                return Err(ProtocolViolation::MissingEvent.into());
            };
            let raw = event.serialize();
            event.release();
            trace!(event = %raw, "got event");

            let event = match events::decode(&raw) {
                Ok(Decoded::Terminated) => break,
                Ok(Decoded::Event(event)) => event,
                Err(violation) => {
                    error!(error = %violation, event = %raw, "undecodable event");
                    return Err(violation.into());
                }
            };
            if let Event::Unhandled(_) = event {
                warn!(event = %raw, "unhandled event");
            }
            self.registry.dispatch(&event)?;
        }
        self.state = RunState::Draining;
        Ok(())
    }

    fn finish(&mut self, result: &Result<(), TaskError>) {
        self.state = match result {
            Ok(()) => RunState::Terminated,
            Err(_) => RunState::Failed,
        };
        debug!(state = ?self.state, "task run finished");
    }
}
