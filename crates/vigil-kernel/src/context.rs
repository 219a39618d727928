//! [`NodeContext`] – every piece of shared synchronization state, in one
//! explicitly constructed object.
//!
//! The orchestrator creates it once and hands an `Arc` clone to each thread.
//! Nothing lives in process-wide statics.

use vigil_types::ConsumerRole;

use crate::readiness_gate::ReadinessGate;
use crate::result_cell::ResultCell;

/// Shared state of a running node.  Lives for the whole process.
#[derive(Debug, Default)]
pub struct NodeContext {
    /// Latest measurement, written by producers and read by consumers.
    pub result: ResultCell,
    /// Signalled by the supervisor once it has entered its consume loop.
    pub supervisor_ready: ReadinessGate,
    /// Signalled by the publisher once it has entered its consume loop.
    pub publisher_ready: ReadinessGate,
}

impl NodeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The readiness gate owned by `role`.
    pub fn gate(&self, role: ConsumerRole) -> &ReadinessGate {
        match role {
            ConsumerRole::Supervisor => &self.supervisor_ready,
            ConsumerRole::Publisher => &self.publisher_ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gates_are_independent() {
        let ctx = NodeContext::new();
        ctx.gate(ConsumerRole::Supervisor).signal_ready();
        assert!(ctx.supervisor_ready.is_ready());
        assert!(!ctx.publisher_ready.is_ready());
        assert!(!ctx.gate(ConsumerRole::Publisher).is_ready());
    }
}
