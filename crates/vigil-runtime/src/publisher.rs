//! [`Publisher`] – consumer that forwards every result off the node.

use std::sync::Arc;

use tracing::{info, trace, warn};
use vigil_kernel::NodeContext;
use vigil_middleware::Transport;
use vigil_types::{ConsumerRole, Event, EventPayload, NodeError, ThreadResult};

/// The publishing consumer.
///
/// Each consumed result is wrapped into a measurement [`Event`] and handed
/// to the transport exactly once.  A failed send is logged and the result is
/// dropped; retrying is the transport's decision.
pub struct Publisher {
    transport: Box<dyn Transport>,
    source: String,
    sent: u64,
    failed: u64,
}

impl Publisher {
    pub fn new(transport: Box<dyn Transport>, source: impl Into<String>) -> Self {
        Self {
            transport,
            source: source.into(),
            sent: 0,
            failed: 0,
        }
    }

    /// `(sent, failed)` counters.
    pub fn counters(&self) -> (u64, u64) {
        (self.sent, self.failed)
    }

    /// Hand one result to the transport.
    pub fn forward(&mut self, result: ThreadResult) -> Result<(), NodeError> {
        let event = Event::new(self.source.clone(), EventPayload::Measurement(result));
        match self.transport.send(&event) {
            Ok(()) => {
                self.sent += 1;
                trace!(id = %event.id, transport = self.transport.name(), "result published");
                Ok(())
            }
            Err(e) => {
                self.failed += 1;
                Err(e)
            }
        }
    }

    /// Announce readiness, then consume and forward forever.
    pub fn run(mut self, ctx: Arc<NodeContext>) {
        ctx.gate(ConsumerRole::Publisher).signal_ready();
        info!(transport = self.transport.name(), "publisher ready");
        loop {
            let result = ctx.result.consume_for(ConsumerRole::Publisher);
            if let Err(e) = self.forward(result) {
                warn!(error = %e, "result dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Transport that stores what it is given.
    #[derive(Clone, Default)]
    struct Capture {
        events: Arc<Mutex<Vec<Event>>>,
        fail: bool,
    }

    impl Transport for Capture {
        fn name(&self) -> &str {
            "capture"
        }
        fn send(&mut self, event: &Event) -> Result<(), NodeError> {
            if self.fail {
                return Err(NodeError::Transport("link down".to_string()));
            }
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[test]
    fn forward_wraps_result_in_measurement_event() {
        let capture = Capture::default();
        let mut publisher = Publisher::new(Box::new(capture.clone()), "node-7");
        publisher.forward(ThreadResult::new(10.0, 20.0)).unwrap();

        let events = capture.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, "node-7");
        match events[0].payload {
            EventPayload::Measurement(r) => assert_eq!(r, ThreadResult::new(10.0, 20.0)),
            _ => panic!("unexpected variant"),
        }
        assert_eq!(publisher.counters(), (1, 0));
    }

    #[test]
    fn transport_failure_is_counted_and_returned() {
        let capture = Capture {
            fail: true,
            ..Capture::default()
        };
        let mut publisher = Publisher::new(Box::new(capture), "node");
        assert!(publisher.forward(ThreadResult::light(1.0)).is_err());
        assert_eq!(publisher.counters(), (0, 1));
    }

    #[test]
    fn run_forwards_only_the_latest_of_a_burst() {
        let ctx = Arc::new(NodeContext::new());
        let capture = Capture::default();
        let publisher = Publisher::new(Box::new(capture.clone()), "node");

        // Burst lands before the publisher thread exists.
        ctx.result.publish(ThreadResult::new(10.0, 20.0));
        ctx.result.publish(ThreadResult::new(15.0, 22.0));

        let worker = Arc::clone(&ctx);
        thread::spawn(move || publisher.run(worker));
        ctx.publisher_ready.wait_until_ready();

        let deadline = Instant::now() + Duration::from_secs(2);
        while capture.events.lock().unwrap().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        // Give a duplicate delivery a chance to show up.
        thread::sleep(Duration::from_millis(50));

        let events = capture.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        match events[0].payload {
            EventPayload::Measurement(r) => assert_eq!(r, ThreadResult::new(15.0, 22.0)),
            _ => panic!("unexpected variant"),
        }
    }
}
