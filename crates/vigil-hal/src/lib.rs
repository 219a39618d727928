//! `vigil-hal` – Hardware Abstraction Layer
//!
//! The opaque capability providers of the node.  The concurrency core only
//! ever talks to these traits, so drivers can be swapped (simulation, Linux
//! sysfs, a real board) without touching it.
//!
//! # Modules
//!
//! - [`sensor`] – [`Sensor`][sensor::Sensor]: "read a value" for the light
//!   and internal-temperature producers.
//! - [`led`] – [`Led`][led::Led] and [`LedId`][led::LedId]: the status
//!   indicator.
//! - [`board`] – [`Board`][board::Board]: the set of drivers one node runs.
//! - [`sim`] – in-process simulated drivers for CI and bench runs.
//! - [`sysfs`] – Linux sysfs drivers (thermal zone, LED class).

pub mod board;
pub mod led;
pub mod sensor;
pub mod sim;
pub mod sysfs;

pub use board::Board;
pub use led::{BLINK_LED_PERIOD, Led, LedId};
pub use sensor::Sensor;
