//! TaskBuilder - fluent configuration and observer registration for one task.
//!
//! # Example
//! ```ignore
//! WebConnectivity::builder(&engine)
//!     .add_input("https://www.example.org/")
//!     .set_verbosity(2)
//!     .add_annotation("scope", "example")
//!     .on_status_update_websites(|info| println!("{}: {}", info.url, info.status))
//!     .run()
//!     .await?;
//! ```
//!
//! `add_input` / `add_input_filepath` only exist for kinds whose
//! `TaskDescriptor::Input` is `WithInput`.

use std::marker::PhantomData;

use super::dispatcher::{EventDispatcher, RunState};
use super::profile::{ProfileError, TaskProfile};
use crate::domain::events::{
    EventPayload, FailureMeasurement, FailureMeasurementSubmission, FailureStartup, LogEntry,
    Measurement, StatusEnd, StatusGeoipLookup, StatusMeasurementDone, StatusMeasurementStarted,
    StatusMeasurementUploaded, StatusProgress, StatusQueued, StatusReportCreated, StatusStarted,
    StatusUpdatePerformance, StatusUpdateWebsites, UnhandledEvent,
};
use crate::domain::settings::{Scalar, Settings};
use crate::domain::task_kind::{InputCapability, TaskDescriptor, TaskKind, WithInput};
use crate::domain::verbosity::{LogLevel, Verbosity};
use crate::error::TaskError;
use crate::ports::engine::TaskEngine;
use crate::typed::ObserverResult;

pub struct TaskBuilder<D: TaskDescriptor, E: TaskEngine> {
    engine: E,
    settings: Settings,
    verbosity: Verbosity,
    dispatcher: EventDispatcher,
    _descriptor: PhantomData<D>,
}

/// Entry point from a catalogue marker: `Ndt::builder(engine)`.
pub trait TaskBuilderExt: TaskDescriptor + Sized {
    fn builder<E: TaskEngine>(engine: E) -> TaskBuilder<Self, E> {
        TaskBuilder::new(engine)
    }
}

impl<D: TaskDescriptor> TaskBuilderExt for D {}

macro_rules! observer_methods {
    ($( $(#[$doc:meta])* $method:ident => $payload:ty ),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method<F, R>(mut self, f: F) -> Self
            where
                F: FnMut(&$payload) -> R + Send + 'static,
                R: ObserverResult + 'static,
            {
                self.dispatcher.registry_mut().register::<$payload, F, R>(f);
                self
            }
        )+
    };
}

impl<D: TaskDescriptor, E: TaskEngine> TaskBuilder<D, E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            settings: Settings::new(D::KIND.name()),
            verbosity: Verbosity::default(),
            dispatcher: EventDispatcher::new(),
            _descriptor: PhantomData,
        }
    }

    pub fn kind(&self) -> TaskKind {
        D::KIND
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn verbosity(&self) -> LogLevel {
        self.verbosity.level()
    }

    pub fn state(&self) -> RunState {
        self.dispatcher.state()
    }

    pub fn set_output_filepath(mut self, path: impl Into<String>) -> Self {
        self.settings.set_output_filepath(path);
        self
    }

    pub fn set_log_filepath(mut self, path: impl Into<String>) -> Self {
        self.settings.set_log_filepath(path);
        self
    }

    /// Values above `Debug2` (4) are clamped.
    pub fn set_verbosity(mut self, level: u64) -> Self {
        self.verbosity.set(level);
        self
    }

    pub fn increase_verbosity(mut self) -> Self {
        self.verbosity.increase();
        self
    }

    pub fn decrease_verbosity(mut self) -> Self {
        self.verbosity.decrease();
        self
    }

    pub fn set_option(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.settings.set_option(key, value);
        self
    }

    pub fn add_annotation(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.settings.add_annotation(key, value);
        self
    }

    /// Apply a loaded profile on top of what is already configured.
    ///
    /// Inputs in the profile are rejected for input-less kinds.
    pub fn apply_profile(mut self, profile: &TaskProfile) -> Result<Self, ProfileError> {
        let has_inputs = !profile.inputs.is_empty() || !profile.input_filepaths.is_empty();
        if has_inputs && !<D::Input as InputCapability>::ACCEPTS_INPUT {
            return Err(ProfileError::InputsNotAccepted(D::KIND));
        }
        if let Some(v) = profile.verbosity {
            self.verbosity.set(v);
        }
        if let Some(path) = &profile.output_filepath {
            self.settings.set_output_filepath(path.clone());
        }
        if let Some(path) = &profile.log_filepath {
            self.settings.set_log_filepath(path.clone());
        }
        for (k, v) in &profile.options {
            self.settings.set_option(k.clone(), v.clone());
        }
        for (k, v) in &profile.annotations {
            self.settings.add_annotation(k.clone(), v.clone());
        }
        for input in &profile.inputs {
            self.settings.push_input(input.clone());
        }
        for path in &profile.input_filepaths {
            self.settings.push_input_filepath(path.clone());
        }
        Ok(self)
    }

    /// Register an observer for any payload type.
    pub fn on<P, F, R>(mut self, f: F) -> Self
    where
        P: EventPayload,
        F: FnMut(&P) -> R + Send + 'static,
        R: ObserverResult + 'static,
    {
        self.dispatcher.registry_mut().register::<P, F, R>(f);
        self
    }

    observer_methods! {
        on_failure_measurement => FailureMeasurement,
        on_failure_measurement_submission => FailureMeasurementSubmission,
        /// Also receives the engine's refusal to start.
        on_failure_startup => FailureStartup,
        on_log => LogEntry,
        on_measurement => Measurement,
        on_status_end => StatusEnd,
        on_status_geoip_lookup => StatusGeoipLookup,
        on_status_progress => StatusProgress,
        on_status_measurement_started => StatusMeasurementStarted,
        on_status_measurement_uploaded => StatusMeasurementUploaded,
        on_status_measurement_done => StatusMeasurementDone,
        on_status_report_created => StatusReportCreated,
        on_status_update_performance => StatusUpdatePerformance,
        on_status_update_websites => StatusUpdateWebsites,
    }

    pub fn on_status_queued<F, R>(self, mut f: F) -> Self
    where
        F: FnMut() -> R + Send + 'static,
        R: ObserverResult + 'static,
    {
        self.on(move |_: &StatusQueued| f())
    }

    pub fn on_status_started<F, R>(self, mut f: F) -> Self
    where
        F: FnMut() -> R + Send + 'static,
        R: ObserverResult + 'static,
    {
        self.on(move |_: &StatusStarted| f())
    }

    /// Events with an unknown key, as the engine serialized them.
    pub fn on_unhandled_event<F, R>(self, mut f: F) -> Self
    where
        F: FnMut(&str) -> R + Send + 'static,
        R: ObserverResult + 'static,
    {
        self.on(move |e: &UnhandledEvent| f(&e.raw))
    }

    /// Start the task and deliver its events until it terminates.
    ///
    /// A builder runs at most once; later calls fail with
    /// [`TaskError::AlreadyRunning`] without touching the engine.
    pub async fn run(&mut self) -> Result<(), TaskError> {
        if self.dispatcher.state() == RunState::Idle {
            self.settings
                .set_log_level(self.verbosity.level().as_setting());
        }
        self.dispatcher.run(&self.engine, &self.settings).await
    }
}

impl<D, E> TaskBuilder<D, E>
where
    D: TaskDescriptor<Input = WithInput>,
    E: TaskEngine,
{
    pub fn add_input(mut self, input: impl Into<String>) -> Self {
        self.settings.push_input(input);
        self
    }

    pub fn add_input_filepath(mut self, path: impl Into<String>) -> Self {
        self.settings.push_input_filepath(path);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::{Value, json};

    use super::*;
    use crate::domain::task_kind::{Ndt, TcpConnect, WebConnectivity};
    use crate::impls::ScriptedEngine;

    fn terminated() -> Value {
        json!({ "key": "task_terminated", "value": {} })
    }

    fn started_settings(engine: &ScriptedEngine) -> Value {
        let started = engine.probe().started();
        assert_eq!(started.len(), 1);
        serde_json::from_str(&started[0]).unwrap()
    }

    #[test]
    fn name_is_seeded_from_descriptor() {
        let b = Ndt::builder(ScriptedEngine::default());
        assert_eq!(b.settings().name(), "Ndt");
        assert_eq!(b.kind(), TaskKind::Ndt);
        assert_eq!(b.state(), RunState::Idle);
    }

    #[test]
    fn verbosity_operations_stay_in_range() {
        let b = Ndt::builder(ScriptedEngine::default())
            .set_verbosity(9)
            .increase_verbosity();
        assert_eq!(b.verbosity(), LogLevel::Debug2);
        let b = b.set_verbosity(0).decrease_verbosity();
        assert_eq!(b.verbosity(), LogLevel::Quiet);
        let b = b.increase_verbosity().increase_verbosity();
        assert_eq!(b.verbosity(), LogLevel::Info);
    }

    #[test]
    fn builders_do_not_share_state() {
        let a = WebConnectivity::builder(ScriptedEngine::default()).add_input("https://a.example/");
        let b = WebConnectivity::builder(ScriptedEngine::default());
        assert_eq!(a.settings().inputs().len(), 1);
        assert!(b.settings().inputs().is_empty());
    }

    #[tokio::test]
    async fn run_sends_finalized_settings() {
        let engine = ScriptedEngine::from_values([terminated()]);
        let mut b = TcpConnect::builder(&engine)
            .set_verbosity(2)
            .set_output_filepath("out.njson")
            .set_log_filepath("log.txt")
            .set_option("port", 80)
            .set_option("port", 443)
            .add_annotation("scope", "example")
            .add_input("a.example:443")
            .add_input_filepath("hosts.txt");
        b.run().await.unwrap();

        assert_eq!(
            started_settings(&engine),
            json!({
                "name": "TcpConnect",
                "log_level": "INFO",
                "output_filepath": "out.njson",
                "log_filepath": "log.txt",
                "options": { "port": 443 },
                "annotations": { "scope": "example" },
                "inputs": ["a.example:443"],
                "input_filepaths": ["hosts.txt"],
            })
        );
    }

    #[tokio::test]
    async fn quiet_run_has_no_log_level() {
        let engine = ScriptedEngine::from_values([terminated()]);
        let mut b = Ndt::builder(&engine).set_verbosity(1).decrease_verbosity();
        b.run().await.unwrap();
        assert!(started_settings(&engine).get("log_level").is_none());
    }

    #[tokio::test]
    async fn field_less_and_unhandled_observers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = ScriptedEngine::from_values([
            json!({ "key": "status.queued", "value": {} }),
            json!({ "key": "status.started", "value": {} }),
            json!({ "key": "status.whatever", "value": { "a": 1 } }),
            terminated(),
        ]);
        let (s1, s2, s3) = (seen.clone(), seen.clone(), seen.clone());
        let mut b = Ndt::builder(&engine)
            .on_status_queued(move || s1.lock().unwrap().push("queued".to_string()))
            .on_status_started(move || s2.lock().unwrap().push("started".to_string()))
            .on_unhandled_event(move |raw| s3.lock().unwrap().push(raw.to_string()));
        b.run().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], "queued");
        assert_eq!(seen[1], "started");
        let raw: Value = serde_json::from_str(&seen[2]).unwrap();
        assert_eq!(raw["key"], "status.whatever");
    }

    #[tokio::test]
    async fn second_run_is_rejected_without_starting() {
        let engine = ScriptedEngine::from_values([terminated()]);
        let mut b = Ndt::builder(&engine);
        b.run().await.unwrap();
        assert_eq!(b.state(), RunState::Terminated);

        let err = b.run().await.unwrap_err();
        assert!(matches!(err, TaskError::AlreadyRunning));
        assert_eq!(engine.probe().start_count(), 1);
        assert_eq!(b.state(), RunState::Terminated);
    }

    #[test]
    fn profile_with_inputs_is_rejected_for_inputless_kind() {
        let profile: TaskProfile =
            serde_json::from_value(json!({ "inputs": ["https://a.example/"] })).unwrap();
        let err = Ndt::builder(ScriptedEngine::default())
            .apply_profile(&profile)
            .err()
            .unwrap();
        assert!(matches!(err, ProfileError::InputsNotAccepted(TaskKind::Ndt)));
    }

    #[test]
    fn profile_layers_over_fluent_settings() {
        let profile: TaskProfile = serde_json::from_value(json!({
            "verbosity": 3,
            "options": { "server": "b.example" },
            "annotations": { "run": 2 },
            "inputs": ["https://b.example/"],
        }))
        .unwrap();
        let b = WebConnectivity::builder(ScriptedEngine::default())
            .set_option("server", "a.example")
            .add_input("https://a.example/")
            .apply_profile(&profile)
            .unwrap();
        assert_eq!(b.verbosity(), LogLevel::Debug);
        assert_eq!(b.settings().option("server"), Some(&Scalar::from("b.example")));
        assert_eq!(b.settings().annotation("run"), Some(&Scalar::Integer(2)));
        assert_eq!(
            b.settings().inputs(),
            ["https://a.example/", "https://b.example/"]
        );
    }
}
