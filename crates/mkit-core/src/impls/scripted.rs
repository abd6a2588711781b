//! ScriptedEngine - in-memory engine replaying serialized events.
//!
//! Used by tests and by the CLI `--replay` mode. Each started task gets its
//! own copy of the script; [`ScriptProbe`] records what happened.
//!
//! # Example
//! ```ignore
//! let engine = ScriptedEngine::new([
//!     r#"{"key":"status.started","value":{}}"#,
//!     r#"{"key":"task_terminated","value":{}}"#,
//! ]);
//! let probe = engine.probe();
//! Ndt::builder(&engine).run().await?;
//! assert_eq!(probe.tasks_released(), 1);
//! ```

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::StartupError;
use crate::ports::engine::{EngineEvent, EngineTask, TaskEngine};

/// Shared record of what the engine saw.
#[derive(Debug, Default)]
pub struct ScriptProbe {
    started: Mutex<Vec<String>>,
    tasks_released: AtomicUsize,
    events_released: AtomicUsize,
}

impl ScriptProbe {
    /// Settings documents passed to `start`, in order.
    pub fn started(&self) -> Vec<String> {
        self.started
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn start_count(&self) -> usize {
        self.started.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn tasks_released(&self) -> usize {
        self.tasks_released.load(Ordering::SeqCst)
    }

    pub fn events_released(&self) -> usize {
        self.events_released.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    // `None` entries make `wait_for_next_event` come back empty-handed.
    script: Vec<Option<String>>,
    refuse: Option<String>,
    probe: Arc<ScriptProbe>,
}

impl ScriptedEngine {
    pub fn new<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: events.into_iter().map(|e| Some(e.into())).collect(),
            ..Self::default()
        }
    }

    pub fn from_values<I>(events: I) -> Self
    where
        I: IntoIterator<Item = serde_json::Value>,
    {
        Self::new(events.into_iter().map(|v| v.to_string()))
    }

    /// Newline-delimited events; blank lines are skipped.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        ))
    }

    /// An engine whose `start` always fails with `reason`.
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            refuse: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn push_event(mut self, event: impl Into<String>) -> Self {
        self.script.push(Some(event.into()));
        self
    }

    /// Append a slot where the engine produces no event.
    pub fn push_missing(mut self) -> Self {
        self.script.push(None);
        self
    }

    pub fn probe(&self) -> Arc<ScriptProbe> {
        self.probe.clone()
    }
}

impl TaskEngine for ScriptedEngine {
    type Task = ScriptedTask;

    fn start(&self, settings: &str) -> Result<ScriptedTask, StartupError> {
        if let Some(reason) = &self.refuse {
            return Err(StartupError::new(reason.clone()));
        }
        if let Ok(mut started) = self.probe.started.lock() {
            started.push(settings.to_string());
        }
        Ok(ScriptedTask {
            script: self.script.iter().cloned().collect(),
            probe: self.probe.clone(),
            destroyed: false,
        })
    }
}

pub struct ScriptedTask {
    script: VecDeque<Option<String>>,
    probe: Arc<ScriptProbe>,
    destroyed: bool,
}

#[async_trait]
impl EngineTask for ScriptedTask {
    type Event = ScriptedEvent;

    fn is_done(&self) -> bool {
        self.destroyed || self.script.is_empty()
    }

    async fn wait_for_next_event(&mut self) -> Option<ScriptedEvent> {
        tokio::task::yield_now().await;
        let raw = self.script.pop_front().flatten()?;
        Some(ScriptedEvent {
            raw,
            probe: self.probe.clone(),
            destroyed: false,
        })
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.probe.tasks_released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub struct ScriptedEvent {
    raw: String,
    probe: Arc<ScriptProbe>,
    destroyed: bool,
}

impl EngineEvent for ScriptedEvent {
    fn serialize(&self) -> String {
        self.raw.clone()
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.probe.events_released.fetch_add(1, Ordering::SeqCst);
        }
    }
}
