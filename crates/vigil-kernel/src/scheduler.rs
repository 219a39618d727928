//! [`Scheduler`] – fixed-priority scheduling behind a capability check.
//!
//! Not every target exposes a real-time priority class (or grants it to an
//! unprivileged process).  The orchestrator therefore never calls the OS
//! directly; it asks a [`Scheduler`] whether fixed priorities are supported
//! and lets the scheduler apply them.
//!
//! - [`FifoScheduler`] (Linux): `SCHED_FIFO` through `pthread_setschedparam`.
//! - [`DefaultScheduler`]: degraded mode.  Priorities are not applied and
//!   every thread runs under the platform's default time-sharing policy, so
//!   the preemption order of the priority table is **not** enforced.  This
//!   is a platform limitation and is reported at `warn` level on selection.

use std::sync::Arc;

use tracing::{debug, warn};
use vigil_types::{NodeError, SchedulingMode, ThreadRole};

use crate::priority::PriorityRange;

/// Capability interface for applying thread priorities.
pub trait Scheduler: Send + Sync {
    /// Short name used in logs, e.g. `"fifo"`.
    fn name(&self) -> &'static str;

    /// `true` when [`Scheduler::set_current_priority`] really changes the
    /// calling thread's scheduling class and priority.
    fn supports_fixed_priority(&self) -> bool;

    /// Numeric range of the fixed-priority class, or `None` in degraded mode.
    fn priority_range(&self) -> Option<PriorityRange>;

    /// Move the calling thread to `priority` within the fixed-priority class.
    ///
    /// # Errors
    ///
    /// [`NodeError::Scheduling`] when the platform refuses the request.
    fn set_current_priority(&self, role: ThreadRole, priority: i32) -> Result<(), NodeError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Degraded mode
// ────────────────────────────────────────────────────────────────────────────

/// Scheduler for platforms without a usable fixed-priority class.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultScheduler;

impl Scheduler for DefaultScheduler {
    fn name(&self) -> &'static str {
        "default"
    }

    fn supports_fixed_priority(&self) -> bool {
        false
    }

    fn priority_range(&self) -> Option<PriorityRange> {
        None
    }

    fn set_current_priority(&self, role: ThreadRole, priority: i32) -> Result<(), NodeError> {
        debug!(%role, priority, "fixed priorities unavailable; keeping default scheduling");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SCHED_FIFO
// ────────────────────────────────────────────────────────────────────────────

/// `SCHED_FIFO` scheduler: fixed priorities, FIFO order among equals.
#[cfg(target_os = "linux")]
#[derive(Debug, Clone, Copy)]
pub struct FifoScheduler {
    range: PriorityRange,
}

#[cfg(target_os = "linux")]
impl FifoScheduler {
    /// Query the `SCHED_FIFO` priority range of the running kernel.
    pub fn new() -> Result<Self, NodeError> {
        // SAFETY: plain syscalls without pointer arguments.
        let (min, max) = unsafe {
            (
                libc::sched_get_priority_min(libc::SCHED_FIFO),
                libc::sched_get_priority_max(libc::SCHED_FIFO),
            )
        };
        if min < 0 || max < 0 || min > max {
            return Err(NodeError::Initialization(format!(
                "SCHED_FIFO priority range unavailable: {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(Self {
            range: PriorityRange { min, max },
        })
    }
}

#[cfg(target_os = "linux")]
impl Scheduler for FifoScheduler {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn supports_fixed_priority(&self) -> bool {
        true
    }

    fn priority_range(&self) -> Option<PriorityRange> {
        Some(self.range)
    }

    fn set_current_priority(&self, role: ThreadRole, priority: i32) -> Result<(), NodeError> {
        if priority < self.range.min || priority > self.range.max {
            return Err(NodeError::Scheduling {
                role,
                details: format!(
                    "priority {priority} outside SCHED_FIFO range {}..={}",
                    self.range.min, self.range.max
                ),
            });
        }
        // SAFETY: `sched_param` is a plain C struct; zeroing it is valid and
        // only `sched_priority` is meaningful for SCHED_FIFO.
        let mut param: libc::sched_param = unsafe { std::mem::zeroed() };
        param.sched_priority = priority;
        // SAFETY: `param` outlives the call and `pthread_self` is always valid.
        let rc = unsafe {
            libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param)
        };
        if rc != 0 {
            return Err(NodeError::Scheduling {
                role,
                details: format!(
                    "pthread_setschedparam(SCHED_FIFO, {priority}) failed: {}",
                    std::io::Error::from_raw_os_error(rc)
                ),
            });
        }
        debug!(%role, priority, "SCHED_FIFO priority applied");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Selection
// ────────────────────────────────────────────────────────────────────────────

/// Pick the scheduler for `mode`.
///
/// In [`SchedulingMode::Auto`] the fixed-priority class is probed by moving
/// the calling thread to the class minimum, so call this on the thread that
/// will run the [`Orchestrator`][crate::orchestrator::Orchestrator] (it
/// raises itself right afterwards anyway).
///
/// # Errors
///
/// [`NodeError::Initialization`] when `mode` is [`SchedulingMode::Fifo`] and
/// the platform does not provide `SCHED_FIFO`.
pub fn select_scheduler(mode: SchedulingMode) -> Result<Arc<dyn Scheduler>, NodeError> {
    match mode {
        SchedulingMode::Default => {
            warn!("fixed-priority scheduling disabled by configuration; priority order is not enforced");
            Ok(Arc::new(DefaultScheduler))
        }
        SchedulingMode::Fifo => fifo_scheduler().map(|s| s as Arc<dyn Scheduler>),
        SchedulingMode::Auto => match probe_fifo() {
            Ok(scheduler) => Ok(scheduler),
            Err(e) => {
                warn!(
                    error = %e,
                    "fixed-priority scheduling unavailable; degrading to default scheduling, priority order is not enforced"
                );
                Ok(Arc::new(DefaultScheduler))
            }
        },
    }
}

#[cfg(target_os = "linux")]
fn fifo_scheduler() -> Result<Arc<FifoScheduler>, NodeError> {
    FifoScheduler::new().map(Arc::new)
}

#[cfg(not(target_os = "linux"))]
fn fifo_scheduler() -> Result<Arc<DefaultScheduler>, NodeError> {
    Err(NodeError::Initialization(
        "SCHED_FIFO is not available on this platform".to_string(),
    ))
}

fn probe_fifo() -> Result<Arc<dyn Scheduler>, NodeError> {
    let scheduler = fifo_scheduler()?;
    if let Some(range) = scheduler.priority_range() {
        scheduler.set_current_priority(ThreadRole::Orchestrator, range.min)?;
    }
    Ok(scheduler as Arc<dyn Scheduler>)
}
