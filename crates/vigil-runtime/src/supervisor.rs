//! [`Supervisor`] – consumer that checks every result.
//!
//! The supervisor consumes each new result exactly once (or only the latest
//! of a burst, since the cell is last-value-wins), compares the readings it
//! carries with the configured [`SupervisorLimits`] and logs the outcome.
//! Out-of-range readings can additionally be forwarded as
//! [`EventPayload::Alert`] events to an alert sink.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use vigil_kernel::NodeContext;
use vigil_middleware::Transport;
use vigil_types::{ConsumerRole, Event, EventPayload, ThreadResult};

/// Acceptable band for each reading (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupervisorLimits {
    pub light_min: f32,
    pub light_max: f32,
    pub temp_min: f32,
    pub temp_max: f32,
}

impl Default for SupervisorLimits {
    fn default() -> Self {
        Self {
            light_min: 0.0,
            light_max: 2000.0,
            temp_min: -20.0,
            temp_max: 85.0,
        }
    }
}

/// A reading outside its band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Finding {
    LightOutOfRange(f32),
    TempOutOfRange(f32),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::LightOutOfRange(v) => write!(f, "light {v} lx out of range"),
            Finding::TempOutOfRange(v) => write!(f, "internal temperature {v} °C out of range"),
        }
    }
}

/// Running counters, mostly for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    pub inspected: u64,
    pub out_of_range: u64,
}

/// The supervising consumer.
pub struct Supervisor {
    limits: SupervisorLimits,
    stats: SupervisorStats,
    alerts: Option<Box<dyn Transport>>,
}

impl Supervisor {
    pub fn new(limits: SupervisorLimits) -> Self {
        Self {
            limits,
            stats: SupervisorStats::default(),
            alerts: None,
        }
    }

    /// Also send every finding as an alert event through `sink`.
    pub fn with_alert_sink(mut self, sink: Box<dyn Transport>) -> Self {
        self.alerts = Some(sink);
        self
    }

    pub fn stats(&self) -> SupervisorStats {
        self.stats
    }

    /// Check one consumed result.  Returns the readings that are out of range.
    pub fn inspect(&mut self, result: &ThreadResult) -> Vec<Finding> {
        self.stats.inspected += 1;
        let mut findings = Vec::new();
        if let Some(light) = result.light
            && !(self.limits.light_min..=self.limits.light_max).contains(&light)
        {
            findings.push(Finding::LightOutOfRange(light));
        }
        if let Some(temp) = result.internal_temp
            && !(self.limits.temp_min..=self.limits.temp_max).contains(&temp)
        {
            findings.push(Finding::TempOutOfRange(temp));
        }

        if findings.is_empty() {
            debug!(light = ?result.light, internal_temp = ?result.internal_temp, "result nominal");
        } else {
            self.stats.out_of_range += 1;
            for finding in &findings {
                warn!(%finding, "supervisor check failed");
                self.raise(finding);
            }
        }
        findings
    }

    fn raise(&mut self, finding: &Finding) {
        let Some(sink) = self.alerts.as_mut() else {
            return;
        };
        let component = match finding {
            Finding::LightOutOfRange(_) => "light_sensor",
            Finding::TempOutOfRange(_) => "internal_temp",
        };
        let event = Event::new(
            "vigil-supervisor",
            EventPayload::Alert {
                component: component.to_string(),
                message: finding.to_string(),
            },
        );
        if let Err(e) = sink.send(&event) {
            warn!(sink = sink.name(), error = %e, "alert could not be delivered");
        }
    }

    /// Announce readiness, then consume and check forever.
    pub fn run(mut self, ctx: Arc<NodeContext>) {
        ctx.gate(ConsumerRole::Supervisor).signal_ready();
        info!(limits = ?self.limits, "supervisor ready");
        loop {
            let result = ctx.result.consume_for(ConsumerRole::Supervisor);
            self.inspect(&result);
        }
    }
}
