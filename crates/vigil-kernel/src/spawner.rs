//! [`Spawner`] – thread creation at a fixed priority.
//!
//! `std::thread` has no attribute object for a scheduling class, so a child
//! thread applies its own priority as its very first action and reports the
//! outcome over a one-slot channel.  [`Spawner::spawn`] returns only after
//! that report, which means a returned [`TaskHandle`] always refers to a
//! thread already running at its assigned priority.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::debug;
use vigil_types::{NodeError, ThreadRole};

use crate::scheduler::Scheduler;

/// What to create: a role and, when fixed priorities are available, the
/// absolute priority to run it at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    pub role: ThreadRole,
    pub priority: Option<i32>,
}

/// Handle of a created thread, retained for the lifetime of the process.
#[derive(Debug)]
pub struct TaskHandle {
    role: ThreadRole,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn new(role: ThreadRole, handle: JoinHandle<()>) -> Self {
        Self { role, handle }
    }

    pub fn role(&self) -> ThreadRole {
        self.role
    }

    /// `true` once the thread body has returned or panicked.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the thread ends.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

/// Creates the node's threads.
pub trait Spawner: Send + Sync {
    /// Start `body` on a new thread described by `spec`.
    ///
    /// # Errors
    ///
    /// [`NodeError::ThreadCreation`] when the thread cannot be created or
    /// cannot be moved to its priority.
    fn spawn(
        &self,
        spec: TaskSpec,
        body: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<TaskHandle, NodeError>;
}

/// [`Spawner`] backed by named `std::thread`s.
pub struct ThreadSpawner {
    scheduler: Arc<dyn Scheduler>,
    stack_size: Option<usize>,
}

impl ThreadSpawner {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            stack_size: None,
        }
    }

    /// Stack size in bytes for every created thread.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

impl Spawner for ThreadSpawner {
    fn spawn(
        &self,
        spec: TaskSpec,
        body: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<TaskHandle, NodeError> {
        let mut builder = thread::Builder::new().name(spec.role.name().to_string());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        // One slot, not a rendezvous: the child's send must complete without
        // the receiver running.  Under SCHED_FIFO on a single CPU the waiting
        // spawner outranks the child and would otherwise starve it mid-send.
        let (started_tx, started_rx) = mpsc::sync_channel::<Result<(), NodeError>>(1);
        let scheduler = Arc::clone(&self.scheduler);

        let handle = builder
            .spawn(move || {
                let applied = match spec.priority {
                    Some(priority) => scheduler.set_current_priority(spec.role, priority),
                    None => Ok(()),
                };
                let proceed = applied.is_ok();
                let _ = started_tx.send(applied);
                if proceed {
                    body();
                }
            })
            .map_err(|e| NodeError::ThreadCreation {
                role: spec.role,
                details: e.to_string(),
            })?;

        match started_rx.recv() {
            Ok(Ok(())) => {
                debug!(role = %spec.role, priority = ?spec.priority, "thread started");
                Ok(TaskHandle::new(spec.role, handle))
            }
            Ok(Err(e)) => Err(NodeError::ThreadCreation {
                role: spec.role,
                details: e.to_string(),
            }),
            Err(_) => Err(NodeError::ThreadCreation {
                role: spec.role,
                details: "thread ended before reporting its start".to_string(),
            }),
        }
    }
}
