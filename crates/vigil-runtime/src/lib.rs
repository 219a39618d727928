//! `vigil-runtime` – Thread Bodies
//!
//! The loops the orchestrator runs on its threads, each honouring the
//! producer or consumer contract of the shared result cell.
//!
//! # Modules
//!
//! - [`producer`] – [`Producer`][producer::Producer]: sample a sensor,
//!   publish into the [`ResultCell`][vigil_kernel::ResultCell], sleep.
//! - [`supervisor`] – [`Supervisor`][supervisor::Supervisor]: consume every
//!   new result and check it against [`SupervisorLimits`][supervisor::SupervisorLimits].
//! - [`publisher`] – [`Publisher`][publisher::Publisher]: consume every new
//!   result and hand it to a [`Transport`][vigil_middleware::Transport].
//! - [`indicator`] – [`Blinker`][indicator::Blinker]: blink the status LED.
//! - [`assembly`] – [`assemble`][assembly::assemble]: turn a
//!   [`Board`][vigil_hal::Board] and a transport into the
//!   [`NodeTasks`][vigil_kernel::NodeTasks] the orchestrator launches.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter.
//!
//! # Readiness
//!
//! Both consumers signal their own
//! [`ReadinessGate`][vigil_kernel::ReadinessGate] exactly once, right before
//! their first consume.  Until then the orchestrator keeps the producers
//! unborn.

pub mod assembly;
pub mod indicator;
pub mod producer;
pub mod publisher;
pub mod supervisor;
pub mod telemetry;

pub use assembly::{NodeSettings, assemble};
pub use indicator::Blinker;
pub use producer::{Measurand, Producer};
pub use publisher::Publisher;
pub use supervisor::{Finding, Supervisor, SupervisorLimits, SupervisorStats};
