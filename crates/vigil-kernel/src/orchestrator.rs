//! [`Orchestrator`] – the boot sequence.
//!
//! [`Orchestrator::launch`] enforces the only cross-thread ordering contract
//! of the node:
//!
//! 1. Raise the calling thread above every child so the rest of the setup
//!    cannot be preempted by anything it spawns.
//! 2. Create the supervisor, then block on its readiness gate.
//! 3. Create the publisher, then block on its readiness gate.
//! 4. Only then create the LED indicator, the light-sensor producer and the
//!    internal-temperature producer, in that order.
//!
//! Any failure is returned immediately; no further thread is created and
//! nothing is retried.  The caller treats it as a fatal boot error.
//!
//! Gate waits have no timeout.  A consumer that never signals leaves the
//! orchestrator blocked forever and the producers are never created.

use std::any::Any;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};
use vigil_types::{NodeError, ThreadRole};

use crate::context::NodeContext;
use crate::priority::{PriorityRange, PriorityTable};
use crate::scheduler::Scheduler;
use crate::spawner::{Spawner, TaskHandle, TaskSpec};

/// Body of one node thread.  Receives the shared context and is expected
/// to loop forever.
pub type TaskBody = Box<dyn FnOnce(Arc<NodeContext>) + Send + 'static>;

/// The five thread bodies the orchestrator launches.
///
/// The consumer bodies must call `signal_ready` on their own gate in
/// [`NodeContext`] before their first consume, or the boot sequence never
/// completes.
pub struct NodeTasks {
    pub supervisor: TaskBody,
    pub publisher: TaskBody,
    pub led: TaskBody,
    pub light_sensor: TaskBody,
    pub internal_temp: TaskBody,
}

/// Startup sequencer: priorities, creation order and the readiness
/// handshake.
pub struct Orchestrator {
    table: PriorityTable,
    scheduler: Arc<dyn Scheduler>,
    spawner: Box<dyn Spawner>,
}

impl Orchestrator {
    pub fn new(
        table: PriorityTable,
        scheduler: Arc<dyn Scheduler>,
        spawner: Box<dyn Spawner>,
    ) -> Self {
        Self {
            table,
            scheduler,
            spawner,
        }
    }

    /// Run the boot sequence on the calling thread.
    ///
    /// # Errors
    ///
    /// - [`NodeError::Initialization`] – the priority table does not fit the
    ///   scheduler's class.
    /// - [`NodeError::Scheduling`] – the calling thread could not be raised.
    /// - [`NodeError::ThreadCreation`] – a thread could not be created.
    pub fn launch(&self, ctx: Arc<NodeContext>, tasks: NodeTasks) -> Result<RunningNode, NodeError> {
        let range = self.scheduler.priority_range();
        match range {
            Some(range) => self.table.validate(range)?,
            None => self.table.check_order()?,
        }

        // Step 1: outrank every child for the rest of the setup.
        match range {
            Some(range) => {
                let priority = self.table.priority_for(ThreadRole::Orchestrator, range);
                self.scheduler
                    .set_current_priority(ThreadRole::Orchestrator, priority)?;
                info!(scheduler = self.scheduler.name(), priority, "orchestrator priority raised");
            }
            None => warn!(
                scheduler = self.scheduler.name(),
                "no fixed-priority class; threads run under default scheduling"
            ),
        }

        let mut handles = Vec::with_capacity(PriorityTable::CHILD_ORDER.len());

        // Step 2: supervisor, then wait for it.
        handles.push(self.start(ThreadRole::Supervisor, tasks.supervisor, &ctx, range)?);
        info!("waiting for supervisor to become ready");
        ctx.supervisor_ready.wait_until_ready();
        info!("supervisor ready");

        // Step 3: publisher, then wait for it.
        handles.push(self.start(ThreadRole::Publisher, tasks.publisher, &ctx, range)?);
        info!("waiting for publisher to become ready");
        ctx.publisher_ready.wait_until_ready();
        info!("publisher ready");

        // Step 4: both consumers are listening; let the rest run.
        handles.push(self.start(ThreadRole::Led, tasks.led, &ctx, range)?);
        handles.push(self.start(ThreadRole::LightSensor, tasks.light_sensor, &ctx, range)?);
        handles.push(self.start(ThreadRole::InternalTemp, tasks.internal_temp, &ctx, range)?);

        info!(threads = handles.len(), "all node threads launched");
        Ok(RunningNode { handles })
    }

    fn start(
        &self,
        role: ThreadRole,
        body: TaskBody,
        ctx: &Arc<NodeContext>,
        range: Option<PriorityRange>,
    ) -> Result<TaskHandle, NodeError> {
        let priority = range.map(|r| self.table.priority_for(role, r));
        info!(%role, ?priority, "creating thread");
        let ctx = Arc::clone(ctx);
        self.spawner
            .spawn(TaskSpec { role, priority }, Box::new(move || body(ctx)))
    }
}

/// Handles of every launched thread, retained for the process lifetime.
#[derive(Debug)]
pub struct RunningNode {
    handles: Vec<TaskHandle>,
}

impl RunningNode {
    /// Roles in creation order.
    pub fn roles(&self) -> Vec<ThreadRole> {
        self.handles.iter().map(TaskHandle::role).collect()
    }

    /// Block for as long as every thread keeps running.
    ///
    /// Node threads never return, so this only comes back when one of them
    /// has ended (normally through a panic).  The returned error names it.
    pub fn wait(self, poll: Duration) -> NodeError {
        let mut handles = self.handles;
        loop {
            if let Some(pos) = handles.iter().position(TaskHandle::is_finished) {
                let handle = handles.swap_remove(pos);
                let role = handle.role();
                let details = match handle.join() {
                    Ok(()) => "returned unexpectedly".to_string(),
                    Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
                };
                error!(%role, %details, "node thread ended");
                return NodeError::TaskExited { role, details };
            }
            if handles.is_empty() {
                return NodeError::Initialization("no node threads are running".to_string());
            }
            thread::sleep(poll);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::DefaultScheduler;
    use crate::spawner::ThreadSpawner;
    use std::sync::Mutex;
    use std::sync::mpsc;
    use vigil_types::{ConsumerRole, ThreadResult};

    // ------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------

    #[derive(Debug, Clone, PartialEq)]
    enum Step {
        Spawn(ThreadRole),
        Ready(ConsumerRole),
    }

    type Log = Arc<Mutex<Vec<Step>>>;

    /// Records every spawn (and the gate state at that moment) before
    /// delegating to a real [`ThreadSpawner`].
    struct RecordingSpawner {
        inner: ThreadSpawner,
        log: Log,
        gates_at_producer_spawn: Arc<Mutex<Vec<(bool, bool)>>>,
        ctx: Arc<NodeContext>,
        fail_on: Option<ThreadRole>,
    }

    impl Spawner for RecordingSpawner {
        fn spawn(
            &self,
            spec: TaskSpec,
            body: Box<dyn FnOnce() + Send + 'static>,
        ) -> Result<TaskHandle, NodeError> {
            if self.fail_on == Some(spec.role) {
                return Err(NodeError::ThreadCreation {
                    role: spec.role,
                    details: "injected failure".to_string(),
                });
            }
            if spec.role.is_producer() {
                self.gates_at_producer_spawn.lock().unwrap().push((
                    self.ctx.supervisor_ready.is_ready(),
                    self.ctx.publisher_ready.is_ready(),
                ));
            }
            self.log.lock().unwrap().push(Step::Spawn(spec.role));
            self.inner.spawn(spec, body)
        }
    }

    /// Records every priority change as `(role, priority)`.
    struct RecordingScheduler {
        calls: Arc<Mutex<Vec<(ThreadRole, i32)>>>,
    }

    impl Scheduler for RecordingScheduler {
        fn name(&self) -> &'static str {
            "recording"
        }
        fn supports_fixed_priority(&self) -> bool {
            true
        }
        fn priority_range(&self) -> Option<PriorityRange> {
            Some(PriorityRange { min: 1, max: 99 })
        }
        fn set_current_priority(&self, role: ThreadRole, priority: i32) -> Result<(), NodeError> {
            self.calls.lock().unwrap().push((role, priority));
            Ok(())
        }
    }

    struct Harness {
        ctx: Arc<NodeContext>,
        log: Log,
        gates_at_producer_spawn: Arc<Mutex<Vec<(bool, bool)>>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                ctx: Arc::new(NodeContext::new()),
                log: Arc::new(Mutex::new(Vec::new())),
                gates_at_producer_spawn: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn orchestrator(&self, scheduler: Arc<dyn Scheduler>, fail_on: Option<ThreadRole>) -> Orchestrator {
            let spawner = RecordingSpawner {
                inner: ThreadSpawner::new(Arc::clone(&scheduler)),
                log: Arc::clone(&self.log),
                gates_at_producer_spawn: Arc::clone(&self.gates_at_producer_spawn),
                ctx: Arc::clone(&self.ctx),
                fail_on,
            };
            Orchestrator::new(PriorityTable::default(), scheduler, Box::new(spawner))
        }

        /// Consumer body that records and signals its readiness, then
        /// consumes forever.  Pass `signal = false` to simulate a consumer
        /// that never becomes ready.
        fn consumer(&self, role: ConsumerRole, signal: bool) -> TaskBody {
            let log = Arc::clone(&self.log);
            Box::new(move |ctx: Arc<NodeContext>| {
                if !signal {
                    return;
                }
                log.lock().unwrap().push(Step::Ready(role));
                ctx.gate(role).signal_ready();
                loop {
                    let _ = ctx.result.consume_for(role);
                }
            })
        }

        fn tasks(&self, publisher_signals: bool) -> NodeTasks {
            NodeTasks {
                supervisor: self.consumer(ConsumerRole::Supervisor, true),
                publisher: self.consumer(ConsumerRole::Publisher, publisher_signals),
                led: Box::new(|_: Arc<NodeContext>| {}),
                light_sensor: Box::new(|ctx: Arc<NodeContext>| {
                    ctx.result.publish(ThreadResult::light(1.0))
                }),
                internal_temp: Box::new(|ctx: Arc<NodeContext>| {
                    ctx.result.publish(ThreadResult::internal_temp(2.0))
                }),
            }
        }

        fn log(&self) -> Vec<Step> {
            self.log.lock().unwrap().clone()
        }
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[test]
    fn threads_are_created_in_order_after_both_handshakes() {
        let h = Harness::new();
        let node = h
            .orchestrator(Arc::new(DefaultScheduler), None)
            .launch(Arc::clone(&h.ctx), h.tasks(true))
            .unwrap();

        assert_eq!(
            h.log(),
            vec![
                Step::Spawn(ThreadRole::Supervisor),
                Step::Ready(ConsumerRole::Supervisor),
                Step::Spawn(ThreadRole::Publisher),
                Step::Ready(ConsumerRole::Publisher),
                Step::Spawn(ThreadRole::Led),
                Step::Spawn(ThreadRole::LightSensor),
                Step::Spawn(ThreadRole::InternalTemp),
            ]
        );
        assert_eq!(
            node.roles(),
            vec![
                ThreadRole::Supervisor,
                ThreadRole::Publisher,
                ThreadRole::Led,
                ThreadRole::LightSensor,
                ThreadRole::InternalTemp,
            ]
        );
    }

    #[test]
    fn producers_only_spawn_with_both_gates_open() {
        let h = Harness::new();
        h.orchestrator(Arc::new(DefaultScheduler), None)
            .launch(Arc::clone(&h.ctx), h.tasks(true))
            .unwrap();
        let gates = h.gates_at_producer_spawn.lock().unwrap().clone();
        assert_eq!(gates, vec![(true, true), (true, true)]);
    }

    #[test]
    fn unsignalled_gate_blocks_producer_creation() {
        let h = Harness::new();
        let orchestrator = h.orchestrator(Arc::new(DefaultScheduler), None);
        let ctx = Arc::clone(&h.ctx);
        let tasks = h.tasks(false);
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let outcome = orchestrator.launch(ctx, tasks).map(|n| n.roles());
            let _ = tx.send(outcome);
        });

        // Bounded-time harness: the launch must still be blocked.
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
        let log = h.log();
        assert_eq!(
            log,
            vec![
                Step::Spawn(ThreadRole::Supervisor),
                Step::Ready(ConsumerRole::Supervisor),
                Step::Spawn(ThreadRole::Publisher),
            ]
        );
        assert!(h.gates_at_producer_spawn.lock().unwrap().is_empty());
    }

    #[test]
    fn priorities_follow_table_with_orchestrator_first() {
        let h = Harness::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let scheduler = Arc::new(RecordingScheduler {
            calls: Arc::clone(&calls),
        });
        h.orchestrator(scheduler, None)
            .launch(Arc::clone(&h.ctx), h.tasks(true))
            .unwrap();

        let calls = calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                (ThreadRole::Orchestrator, 98),
                (ThreadRole::Supervisor, 11),
                (ThreadRole::Publisher, 10),
                (ThreadRole::Led, 9),
                (ThreadRole::LightSensor, 8),
                (ThreadRole::InternalTemp, 7),
            ]
        );
    }

    #[test]
    fn creation_failure_stops_the_sequence() {
        let h = Harness::new();
        let err = h
            .orchestrator(Arc::new(DefaultScheduler), Some(ThreadRole::LightSensor))
            .launch(Arc::clone(&h.ctx), h.tasks(true))
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::ThreadCreation {
                role: ThreadRole::LightSensor,
                ..
            }
        ));
        assert!(!h.log().contains(&Step::Spawn(ThreadRole::InternalTemp)));
    }

    #[test]
    fn invalid_table_is_rejected_before_any_spawn() {
        let h = Harness::new();
        let spawner = ThreadSpawner::new(Arc::new(DefaultScheduler));
        let table = PriorityTable {
            led: 20,
            ..PriorityTable::default()
        };
        let orchestrator = Orchestrator::new(table, Arc::new(DefaultScheduler), Box::new(spawner));
        let err = orchestrator
            .launch(Arc::clone(&h.ctx), h.tasks(true))
            .unwrap_err();
        assert!(matches!(err, NodeError::Initialization(_)));
        assert!(!h.ctx.supervisor_ready.is_ready());
    }

    #[test]
    fn wait_reports_a_panicked_thread() {
        let h = Harness::new();
        let mut tasks = h.tasks(true);
        tasks.led = Box::new(|_: Arc<NodeContext>| panic!("led driver exploded"));
        let node = h
            .orchestrator(Arc::new(DefaultScheduler), None)
            .launch(Arc::clone(&h.ctx), tasks)
            .unwrap();
        // Producers in this harness return right away; whichever ended
        // first is reported.
        match node.wait(Duration::from_millis(5)) {
            NodeError::TaskExited { details, .. } => assert!(!details.is_empty()),
            other => panic!("expected TaskExited, got {other:?}"),
        }
    }

    #[test]
    fn panic_message_extracts_strings() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
