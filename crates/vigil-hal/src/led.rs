//! Generic `Led` trait and the board's LED inventory.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use vigil_types::NodeError;

/// Default blink period of the status indicator.
pub const BLINK_LED_PERIOD: Duration = Duration::from_millis(1000);

/// LEDs available on the monitoring board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LedId {
    #[default]
    Red1,
    Green1,
    Green2,
}

impl LedId {
    /// Board label of the LED.
    pub fn label(self) -> &'static str {
        match self {
            LedId::Red1 => "RED1",
            LedId::Green1 => "GREEN1",
            LedId::Green2 => "GREEN2",
        }
    }
}

impl fmt::Display for LedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LedId {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RED1" => Ok(LedId::Red1),
            "GREEN1" => Ok(LedId::Green1),
            "GREEN2" => Ok(LedId::Green2),
            other => Err(NodeError::Config(format!("unknown LED '{other}'"))),
        }
    }
}

/// A discrete on/off indicator.
pub trait Led: Send {
    /// Which board LED this driver controls.
    fn id(&self) -> LedId;

    /// Drive the LED on (`true`) or off (`false`).
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::HardwareFault`] if the command cannot be applied.
    fn set_state(&mut self, on: bool) -> Result<(), NodeError>;

    /// Return the LED's current state (`true` = lit).
    fn state(&self) -> bool;
}
