use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Every long-running thread the node creates, plus the orchestrator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadRole {
    /// The startup sequencer (the process main thread during setup).
    Orchestrator,
    /// Consumer that inspects every new result against configured limits.
    Supervisor,
    /// Consumer that forwards every new result over the messaging link.
    Publisher,
    /// Status indicator blinking an LED.
    Led,
    /// Producer sampling ambient light.
    LightSensor,
    /// Producer sampling the internal temperature.
    InternalTemp,
}

impl ThreadRole {
    /// Stable thread name, used for OS thread names and log fields.
    pub fn name(self) -> &'static str {
        match self {
            ThreadRole::Orchestrator => "orchestrator",
            ThreadRole::Supervisor => "supervisor",
            ThreadRole::Publisher => "publisher",
            ThreadRole::Led => "led",
            ThreadRole::LightSensor => "light_sensor",
            ThreadRole::InternalTemp => "internal_temp",
        }
    }

    /// `true` for the threads that write into the shared result cell.
    pub fn is_producer(self) -> bool {
        matches!(self, ThreadRole::LightSensor | ThreadRole::InternalTemp)
    }
}

impl fmt::Display for ThreadRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The two consumers of the shared result cell.  Each owns an independent
/// delivery flag and an independent readiness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerRole {
    Supervisor,
    Publisher,
}

impl From<ConsumerRole> for ThreadRole {
    fn from(role: ConsumerRole) -> Self {
        match role {
            ConsumerRole::Supervisor => ThreadRole::Supervisor,
            ConsumerRole::Publisher => ThreadRole::Publisher,
        }
    }
}

impl fmt::Display for ConsumerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ThreadRole::from(*self).fmt(f)
    }
}

/// The latest measurement held by the shared result cell.
///
/// A producer publishes a whole value carrying its own reading.  Because a
/// publish always overwrites the complete value, the light and temperature
/// fields a consumer observes always come from the same publish call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadResult {
    /// Ambient light intensity in lux.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<f32>,
    /// Internal (die) temperature in degrees Celsius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_temp: Option<f32>,
}

impl ThreadResult {
    /// A result carrying both readings.
    pub fn new(light: f32, internal_temp: f32) -> Self {
        Self {
            light: Some(light),
            internal_temp: Some(internal_temp),
        }
    }

    /// A result carrying only a light reading.
    pub fn light(value: f32) -> Self {
        Self {
            light: Some(value),
            internal_temp: None,
        }
    }

    /// A result carrying only an internal temperature reading.
    pub fn internal_temp(value: f32) -> Self {
        Self {
            light: None,
            internal_temp: Some(value),
        }
    }

    /// `true` when neither reading is present (the cell's initial value).
    pub fn is_empty(&self) -> bool {
        self.light.is_none() && self.internal_temp.is_none()
    }
}

/// Envelope handed to the publish transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. `"vigil-node"`
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` in a fresh envelope stamped with the current time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data that leave the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    Measurement(ThreadResult),
    Alert {
        component: String,
        message: String,
    },
}

/// How thread priorities are applied on the target platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingMode {
    /// Require the fixed-priority preemptive class; refusal is fatal.
    Fifo,
    /// Never touch priorities; every thread runs under the default scheduler.
    Default,
    /// Use the fixed-priority class when the platform grants it, otherwise
    /// degrade to default scheduling with a warning.
    #[default]
    Auto,
}

impl fmt::Display for SchedulingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingMode::Fifo => f.write_str("fifo"),
            SchedulingMode::Default => f.write_str("default"),
            SchedulingMode::Auto => f.write_str("auto"),
        }
    }
}

impl std::str::FromStr for SchedulingMode {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(SchedulingMode::Fifo),
            "default" => Ok(SchedulingMode::Default),
            "auto" => Ok(SchedulingMode::Auto),
            other => Err(NodeError::Config(format!("unknown scheduling mode '{other}'"))),
        }
    }
}

/// Error type shared by every crate of the node.
///
/// `Initialization`, `Scheduling`, `ThreadCreation`, `TaskExited` and
/// `Config` are fatal at boot; `HardwareFault` and `Transport` belong to the
/// collaborators and never reach the concurrency core.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Scheduling error for {role}: {details}")]
    Scheduling { role: ThreadRole, details: String },

    #[error("Failed to create {role} thread: {details}")]
    ThreadCreation { role: ThreadRole, details: String },

    #[error("{role} thread exited: {details}")]
    TaskExited { role: ThreadRole, details: String },

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}
