//! In-process simulated drivers for CI and bench runs without a board.
//!
//! The sensors produce deterministic waveforms so that logs and published
//! values are reproducible from run to run.
//!
//! # Example
//!
//! ```rust
//! use vigil_hal::sim;
//!
//! let mut board = sim::board();
//! let lux = board.light.read().expect("sim read must succeed");
//! assert!(lux >= 0.0);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use vigil_types::NodeError;

use crate::board::Board;
use crate::led::{Led, LedId};
use crate::sensor::Sensor;

// ────────────────────────────────────────────────────────────────────────────
// Light
// ────────────────────────────────────────────────────────────────────────────

/// Simulated ambient-light sensor: a triangle wave between `min` and `max`
/// lux, advancing by `step` on every read.
pub struct SimLightSensor {
    min: f32,
    max: f32,
    step: f32,
    value: f32,
    rising: bool,
}

impl SimLightSensor {
    pub fn new(min: f32, max: f32, step: f32) -> Self {
        Self {
            min,
            max,
            step: step.abs(),
            value: min,
            rising: true,
        }
    }
}

impl Default for SimLightSensor {
    fn default() -> Self {
        Self::new(0.0, 1000.0, 50.0)
    }
}

impl Sensor for SimLightSensor {
    fn id(&self) -> &str {
        "light"
    }

    fn read(&mut self) -> Result<f32, NodeError> {
        let current = self.value;
        if self.rising {
            self.value = (self.value + self.step).min(self.max);
            if self.value >= self.max {
                self.rising = false;
            }
        } else {
            self.value = (self.value - self.step).max(self.min);
            if self.value <= self.min {
                self.rising = true;
            }
        }
        Ok(current)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Internal temperature
// ────────────────────────────────────────────────────────────────────────────

/// Simulated die-temperature sensor: drifts around `base` °C within
/// `±amplitude`, repeating every 20 reads.
pub struct SimTemperatureSensor {
    base: f32,
    amplitude: f32,
    tick: u32,
}

impl SimTemperatureSensor {
    const PERIOD: u32 = 20;

    pub fn new(base: f32, amplitude: f32) -> Self {
        Self {
            base,
            amplitude,
            tick: 0,
        }
    }
}

impl Default for SimTemperatureSensor {
    fn default() -> Self {
        Self::new(35.0, 2.0)
    }
}

impl Sensor for SimTemperatureSensor {
    fn id(&self) -> &str {
        "internal_temp"
    }

    fn read(&mut self) -> Result<f32, NodeError> {
        let half = Self::PERIOD / 2;
        let phase = self.tick % Self::PERIOD;
        let ramp = if phase < half {
            phase as f32 / half as f32
        } else {
            (Self::PERIOD - phase) as f32 / half as f32
        };
        self.tick = self.tick.wrapping_add(1);
        // Map [0, 1] onto [-amplitude, +amplitude].
        Ok(self.base + (ramp * 2.0 - 1.0) * self.amplitude)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LED
// ────────────────────────────────────────────────────────────────────────────

/// A simulated LED that records its state and how often it changed.
pub struct SimLed {
    id: LedId,
    probe: SimLedProbe,
}

/// Read-only view of a [`SimLed`] that stays valid after the driver has been
/// moved into its thread.
#[derive(Debug, Clone, Default)]
pub struct SimLedProbe {
    lit: Arc<AtomicBool>,
    toggles: Arc<AtomicUsize>,
}

impl SimLedProbe {
    pub fn is_lit(&self) -> bool {
        self.lit.load(Ordering::SeqCst)
    }

    /// Number of on/off transitions so far.
    pub fn toggles(&self) -> usize {
        self.toggles.load(Ordering::SeqCst)
    }
}

impl SimLed {
    pub fn new(id: LedId) -> Self {
        Self {
            id,
            probe: SimLedProbe::default(),
        }
    }

    pub fn probe(&self) -> SimLedProbe {
        self.probe.clone()
    }
}

impl Led for SimLed {
    fn id(&self) -> LedId {
        self.id
    }

    fn set_state(&mut self, on: bool) -> Result<(), NodeError> {
        if self.probe.lit.swap(on, Ordering::SeqCst) != on {
            self.probe.toggles.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn state(&self) -> bool {
        self.probe.is_lit()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Board
// ────────────────────────────────────────────────────────────────────────────

/// A [`Board`] made of default simulated drivers, blinking [`LedId::Red1`].
pub fn board() -> Board {
    board_with_led(LedId::default())
}

/// A [`Board`] of simulated drivers blinking `led`.
pub fn board_with_led(led: LedId) -> Board {
    Board {
        light: Box::new(SimLightSensor::default()),
        internal_temp: Box::new(SimTemperatureSensor::default()),
        status_led: Box::new(SimLed::new(led)),
    }
}
