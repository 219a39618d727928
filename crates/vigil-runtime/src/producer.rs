//! [`Producer`] – sensor sampling loop.
//!
//! Every period the producer takes one fresh reading from its sensor and
//! publishes it into the shared [`ResultCell`], overwriting whatever was
//! there.  No state survives an iteration except what the driver keeps.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, trace, warn};
use vigil_hal::Sensor;
use vigil_kernel::{NodeContext, ResultCell};
use vigil_types::{NodeError, ThreadResult, ThreadRole};

/// What a producer measures, which decides the field it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurand {
    Light,
    InternalTemp,
}

impl Measurand {
    pub fn role(self) -> ThreadRole {
        match self {
            Measurand::Light => ThreadRole::LightSensor,
            Measurand::InternalTemp => ThreadRole::InternalTemp,
        }
    }

    /// Wrap a raw reading into the value that gets published.
    pub fn result(self, value: f32) -> ThreadResult {
        match self {
            Measurand::Light => ThreadResult::light(value),
            Measurand::InternalTemp => ThreadResult::internal_temp(value),
        }
    }
}

/// Periodic sampler feeding the result cell.
pub struct Producer {
    measurand: Measurand,
    sensor: Box<dyn Sensor>,
    period: Duration,
}

impl Producer {
    pub fn new(measurand: Measurand, sensor: Box<dyn Sensor>, period: Duration) -> Self {
        Self {
            measurand,
            sensor,
            period,
        }
    }

    /// Take one reading and publish it.
    ///
    /// # Errors
    ///
    /// The sensor's error; nothing is published in that case.
    pub fn sample_once(&mut self, cell: &ResultCell) -> Result<ThreadResult, NodeError> {
        let value = self.sensor.read()?;
        let result = self.measurand.result(value);
        cell.publish(result);
        trace!(role = %self.measurand.role(), value, "sample published");
        Ok(result)
    }

    /// Sample forever.  A failed read skips that cycle.
    pub fn run(mut self, ctx: Arc<NodeContext>) {
        let role = self.measurand.role();
        info!(%role, sensor = self.sensor.id(), period_ms = self.period.as_millis() as u64, "producer started");
        loop {
            if let Err(e) = self.sample_once(&ctx.result) {
                warn!(%role, error = %e, "sensor read failed; skipping cycle");
            }
            thread::sleep(self.period);
        }
    }
}
