//! Events - payloads the engine emits and the decoder that produces them.
//!
//! The engine serializes every event as `{"key": ..., "value": {...}}`.
//! Decoding rules:
//! - known key, documented fields present -> typed [`Event`]
//! - known key, a documented field missing or mistyped -> [`ProtocolViolation::MissingField`]
//! - `task_terminated` -> [`Decoded::Terminated`]
//! - any other key -> [`Event::Unhandled`] carrying the raw text
//! - text that is not an event record -> [`ProtocolViolation::MalformedEvent`]

use std::fmt;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ProtocolViolation;

/// Key of the terminal marker. It carries no payload and is never dispatched.
pub const TERMINATED_KEY: &str = "task_terminated";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FailureMeasurement {
    pub failure: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FailureMeasurementSubmission {
    pub idx: i64,
    pub json_str: String,
    pub failure: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FailureStartup {
    pub failure: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEntry {
    pub log_level: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Measurement {
    pub idx: i64,
    pub json_str: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusEnd {
    pub downloaded_kb: f64,
    pub uploaded_kb: f64,
    pub failure: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusGeoipLookup {
    pub probe_ip: String,
    pub probe_asn: String,
    pub probe_cc: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusProgress {
    pub percentage: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusQueued {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusMeasurementStarted {
    pub idx: i64,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusMeasurementUploaded {
    pub idx: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusMeasurementDone {
    pub idx: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusReportCreated {
    pub report_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusStarted {}

// Field-less kinds accept any `value`, including none.
macro_rules! field_less_payload {
    ($( $name:ident ),+) => {
        $(
            impl<'de> Deserialize<'de> for $name {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    IgnoredAny::deserialize(deserializer)?;
                    Ok($name {})
                }
            }
        )+
    };
}

field_less_payload!(StatusQueued, StatusStarted);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusUpdatePerformance {
    pub direction: String,
    pub elapsed: f64,
    pub num_streams: i64,
    pub speed_kbps: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusUpdateWebsites {
    pub url: String,
    pub status: String,
}

/// An event whose key is not in the catalogue, kept as the engine serialized it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnhandledEvent {
    pub raw: String,
}

/// EventPayload maps a payload type to its kind, like a typed tag.
///
/// Used by the observer registry to recover `&Self` from a decoded [`Event`].
pub trait EventPayload: Send + Sync + 'static {
    const KIND: EventKind;

    fn from_event(event: &Event) -> Option<&Self>;
}

macro_rules! event_catalogue {
    ($( $variant:ident => $key:literal ),+ $(,)?) => {
        /// Tag of every kind an observer can register for.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventKind {
            $( $variant, )+
            Unhandled,
        }

        impl EventKind {
            pub const CATALOGUE: &'static [EventKind] = &[ $( EventKind::$variant, )+ ];

            /// Wire key. `Unhandled` has no wire key of its own.
            pub fn key(self) -> &'static str {
                match self {
                    $( EventKind::$variant => $key, )+
                    EventKind::Unhandled => "unhandled",
                }
            }

            pub fn from_key(key: &str) -> Option<Self> {
                match key {
                    $( $key => Some(EventKind::$variant), )+
                    _ => None,
                }
            }
        }

        /// A decoded event, one variant per kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Event {
            $( $variant($variant), )+
            Unhandled(UnhandledEvent),
        }

        impl Event {
            pub fn kind(&self) -> EventKind {
                match self {
                    $( Event::$variant(_) => EventKind::$variant, )+
                    Event::Unhandled(_) => EventKind::Unhandled,
                }
            }

            /// `None` when the key is not in the catalogue.
            fn decode_known(key: &str, value: Value) -> Option<Result<Self, ProtocolViolation>> {
                match key {
                    $( $key => Some(payload(EventKind::$variant, value).map(Event::$variant)), )+
                    _ => None,
                }
            }
        }

        $(
            impl EventPayload for $variant {
                const KIND: EventKind = EventKind::$variant;

                fn from_event(event: &Event) -> Option<&Self> {
                    match event {
                        Event::$variant(p) => Some(p),
                        _ => None,
                    }
                }
            }
        )+
    };
}

event_catalogue! {
    FailureMeasurement => "failure.measurement",
    FailureMeasurementSubmission => "failure.measurement_submission",
    FailureStartup => "failure.startup",
    LogEntry => "log",
    Measurement => "measurement",
    StatusEnd => "status.end",
    StatusGeoipLookup => "status.geoip_lookup",
    StatusProgress => "status.progress",
    StatusQueued => "status.queued",
    StatusMeasurementStarted => "status.measurement_started",
    StatusMeasurementUploaded => "status.measurement_uploaded",
    StatusMeasurementDone => "status.measurement_done",
    StatusReportCreated => "status.report_created",
    StatusStarted => "status.started",
    StatusUpdatePerformance => "status.update.performance",
    StatusUpdateWebsites => "status.update.websites",
}

impl EventPayload for UnhandledEvent {
    const KIND: EventKind = EventKind::Unhandled;

    fn from_event(event: &Event) -> Option<&Self> {
        match event {
            Event::Unhandled(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Outcome of decoding one serialized event.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(Event),
    Terminated,
}

#[derive(Deserialize)]
struct RawEvent {
    key: String,
    #[serde(default)]
    value: Value,
}

/// Decode one serialized event.
pub fn decode(raw: &str) -> Result<Decoded, ProtocolViolation> {
    let RawEvent { key, value } =
        serde_json::from_str(raw).map_err(ProtocolViolation::MalformedEvent)?;
    if key == TERMINATED_KEY {
        return Ok(Decoded::Terminated);
    }
    match Event::decode_known(&key, value) {
        Some(decoded) => decoded.map(Decoded::Event),
        None => Ok(Decoded::Event(Event::Unhandled(UnhandledEvent {
            raw: raw.to_string(),
        }))),
    }
}

fn payload<T: DeserializeOwned>(kind: EventKind, value: Value) -> Result<T, ProtocolViolation> {
    serde_json::from_value(value).map_err(|source| ProtocolViolation::MissingField {
        key: kind.key(),
        source,
    })
}
