//! Linux sysfs drivers.
//!
//! | Driver | sysfs node | Format |
//! |---|---|---|
//! | [`SysfsLightSensor`] | `/sys/bus/iio/devices/iio:device*/in_illuminance_input` | decimal lux |
//! | [`SysfsTemperatureSensor`] | `/sys/class/thermal/thermal_zone*/temp` | integer millidegrees Celsius |
//! | [`SysfsLed`] | `/sys/class/leds/<name>/brightness` | `0` = off, anything else = on |
//!
//! All take the node path explicitly so they can be pointed at any zone or
//! LED class device (or at a plain file in tests).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use vigil_types::NodeError;

use crate::led::{Led, LedId};
use crate::sensor::Sensor;

/// Default thermal zone exposing the SoC die temperature.
pub const DEFAULT_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Default IIO ambient-light channel.
pub const DEFAULT_ILLUMINANCE: &str = "/sys/bus/iio/devices/iio:device0/in_illuminance_input";

fn read_node(component: &str, path: &Path) -> Result<String, NodeError> {
    fs::read_to_string(path)
        .map(|raw| raw.trim().to_string())
        .map_err(|e| NodeError::HardwareFault {
            component: component.to_string(),
            details: format!("failed to read {}: {e}", path.display()),
        })
}

/// Ambient-light sensor backed by an IIO `in_illuminance_input` file.
pub struct SysfsLightSensor {
    path: PathBuf,
}

impl SysfsLightSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Sensor for SysfsLightSensor {
    fn id(&self) -> &str {
        "light"
    }

    fn read(&mut self) -> Result<f32, NodeError> {
        let raw = read_node(self.id(), &self.path)?;
        raw.parse().map_err(|e| NodeError::HardwareFault {
            component: self.id().to_string(),
            details: format!("unexpected illuminance value {raw:?}: {e}"),
        })
    }
}

/// Die-temperature sensor backed by a thermal-zone `temp` file.
pub struct SysfsTemperatureSensor {
    path: PathBuf,
}

impl SysfsTemperatureSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sensor for SysfsTemperatureSensor {
    fn id(&self) -> &str {
        "internal_temp"
    }

    fn read(&mut self) -> Result<f32, NodeError> {
        let raw = read_node(self.id(), &self.path)?;
        let millidegrees: i64 = raw.parse().map_err(|e| NodeError::HardwareFault {
            component: self.id().to_string(),
            details: format!("unexpected thermal value {raw:?}: {e}"),
        })?;
        Ok(millidegrees as f32 / 1000.0)
    }
}

/// LED driven through an LED class `brightness` file.
pub struct SysfsLed {
    id: LedId,
    path: PathBuf,
    state: bool,
}

impl SysfsLed {
    pub fn new(id: LedId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
            state: false,
        }
    }
}

impl Led for SysfsLed {
    fn id(&self) -> LedId {
        self.id
    }

    fn set_state(&mut self, on: bool) -> Result<(), NodeError> {
        let value = if on { "1" } else { "0" };
        fs::write(&self.path, value).map_err(|e| NodeError::HardwareFault {
            component: self.id.label().to_string(),
            details: format!("failed to write {}: {e}", self.path.display()),
        })?;
        self.state = on;
        debug!(led = %self.id, on, "sysfs LED updated");
        Ok(())
    }

    fn state(&self) -> bool {
        self.state
    }
}
