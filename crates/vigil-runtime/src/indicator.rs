//! [`Blinker`] – the status indicator loop.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};
use vigil_hal::Led;
use vigil_kernel::NodeContext;
use vigil_types::NodeError;

/// Toggles one LED every period.  Independent of the result cell.
pub struct Blinker {
    led: Box<dyn Led>,
    period: Duration,
}

impl Blinker {
    pub fn new(led: Box<dyn Led>, period: Duration) -> Self {
        Self { led, period }
    }

    /// Flip the LED once and return its new state.
    ///
    /// # Errors
    ///
    /// The driver's error; the LED keeps its previous state.
    pub fn tick(&mut self) -> Result<bool, NodeError> {
        let next = !self.led.state();
        self.led.set_state(next)?;
        Ok(next)
    }

    /// Blink forever.  A failing driver is logged and retried next period.
    pub fn run(mut self, _ctx: Arc<NodeContext>) {
        let led = self.led.id();
        info!(%led, period_ms = self.period.as_millis() as u64, "status indicator started");
        loop {
            if let Err(e) = self.tick() {
                warn!(%led, error = %e, "LED update failed");
            }
            thread::sleep(self.period);
        }
    }
}
