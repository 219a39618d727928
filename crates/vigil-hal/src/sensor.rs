//! Generic `Sensor` trait for the node's scalar measurement sources.

use vigil_types::NodeError;

/// A scalar sensor (ambient light, die temperature, …).
///
/// Register access and unit conversion live entirely inside the driver;
/// callers only see a ready-to-use value.
pub trait Sensor: Send {
    /// Stable identifier for this sensor, e.g. `"light"`.
    fn id(&self) -> &str;

    /// Acquire a fresh reading.  May block for the duration of a conversion.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::HardwareFault`] if the device cannot be read.
    fn read(&mut self) -> Result<f32, NodeError>;
}
