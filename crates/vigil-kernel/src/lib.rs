//! `vigil-kernel` – Concurrency Core
//!
//! The startup sequencing and shared-state synchronization of the node.  It
//! does not sense or transmit anything; it decides who runs, in which order,
//! and how measurements travel from producers to consumers.
//!
//! # Modules
//!
//! - [`readiness_gate`] – [`ReadinessGate`][readiness_gate::ReadinessGate]:
//!   a one-shot, monotonic latch a freshly spawned consumer uses to tell the
//!   orchestrator it has finished initialising.
//! - [`result_cell`] – [`ResultCell`][result_cell::ResultCell]: the single
//!   last-value-wins slot shared by the producers and both consumers, with
//!   one delivery flag per consumer.
//! - [`context`] – [`NodeContext`][context::NodeContext]: owns the cell and
//!   both gates; shared by `Arc` with every thread instead of globals.
//! - [`priority`] – [`PriorityTable`][priority::PriorityTable]: the static
//!   role → priority mapping inside the fixed-priority class.
//! - [`scheduler`] – [`Scheduler`][scheduler::Scheduler]: capability check
//!   and priority application (`SCHED_FIFO` or degraded default scheduling).
//! - [`spawner`] – [`Spawner`][spawner::Spawner]: thread creation at a given
//!   priority.
//! - [`orchestrator`] – [`Orchestrator`][orchestrator::Orchestrator]: the
//!   boot sequence that holds back the producers until both consumers are
//!   ready.

pub mod context;
pub mod orchestrator;
pub mod priority;
pub mod readiness_gate;
pub mod result_cell;
pub mod scheduler;
pub mod spawner;

pub use context::NodeContext;
pub use orchestrator::{NodeTasks, Orchestrator, RunningNode, TaskBody};
pub use priority::{PriorityRange, PriorityTable};
pub use readiness_gate::ReadinessGate;
pub use result_cell::ResultCell;
pub use scheduler::{DefaultScheduler, Scheduler, select_scheduler};
pub use spawner::{Spawner, TaskHandle, TaskSpec, ThreadSpawner};
pub use vigil_types::SchedulingMode;

#[cfg(target_os = "linux")]
pub use scheduler::FifoScheduler;
