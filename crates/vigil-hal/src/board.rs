//! [`Board`] – the drivers one node runs with.

use crate::led::Led;
use crate::sensor::Sensor;

/// Every hardware collaborator the node needs, handed over to the runtime
/// which moves each driver into the thread that owns it.
pub struct Board {
    pub light: Box<dyn Sensor>,
    pub internal_temp: Box<dyn Sensor>,
    pub status_led: Box<dyn Led>,
}
