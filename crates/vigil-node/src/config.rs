//! Node configuration – reads `~/.vigil/config.toml` (or `$VIGIL_CONFIG`).
//!
//! Every field has a default, so a missing file or a partial file is valid.
//!
//! ```toml
//! [sampling]
//! light_period_ms = 500
//! internal_temp_period_ms = 1000
//!
//! [indicator]
//! led = "RED1"
//! blink_period_ms = 1000
//!
//! [scheduling]
//! mode = "auto"          # fifo | default | auto
//! stack_size = 262144
//!
//! [scheduling.priorities]
//! supervisor = 10
//! publisher = 9
//! led = 8
//! light_sensor = 7
//! internal_temp = 6
//!
//! [supervisor]
//! light_min = 0.0
//! light_max = 2000.0
//! temp_min = -20.0
//! temp_max = 85.0
//! alerts = true
//!
//! [hardware]
//! backend = "sim"        # sim | sysfs
//!
//! [publisher]
//! sink = "stdout"        # or a file path
//! source = "vigil-node"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use vigil_hal::LedId;
use vigil_hal::sysfs::{DEFAULT_ILLUMINANCE, DEFAULT_THERMAL_ZONE};
use vigil_kernel::PriorityTable;
use vigil_runtime::{NodeSettings, SupervisorLimits};
use vigil_types::{NodeError, SchedulingMode};

/// Driver family the board is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sim,
    Sysfs,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Sim => write!(f, "sim"),
            Backend::Sysfs => write!(f, "sysfs"),
        }
    }
}

impl FromStr for Backend {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sim" => Ok(Backend::Sim),
            "sysfs" => Ok(Backend::Sysfs),
            other => Err(NodeError::Config(format!("unknown hardware backend '{other}'"))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSection {
    pub light_period_ms: u64,
    pub internal_temp_period_ms: u64,
}

impl Default for SamplingSection {
    fn default() -> Self {
        Self {
            light_period_ms: 500,
            internal_temp_period_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSection {
    /// Board label of the status LED (`RED1`, `GREEN1`, `GREEN2`).
    pub led: String,
    pub blink_period_ms: u64,
}

impl Default for IndicatorSection {
    fn default() -> Self {
        Self {
            led: LedId::default().label().to_string(),
            blink_period_ms: vigil_hal::BLINK_LED_PERIOD.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrioritySection {
    pub supervisor: i32,
    pub publisher: i32,
    pub led: i32,
    pub light_sensor: i32,
    pub internal_temp: i32,
}

impl Default for PrioritySection {
    fn default() -> Self {
        let table = PriorityTable::default();
        Self {
            supervisor: table.supervisor,
            publisher: table.publisher,
            led: table.led,
            light_sensor: table.light_sensor,
            internal_temp: table.internal_temp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingSection {
    pub mode: SchedulingMode,
    /// Stack size of every node thread in bytes; platform default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<usize>,
    pub priorities: PrioritySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSection {
    pub light_min: f32,
    pub light_max: f32,
    pub temp_min: f32,
    pub temp_max: f32,
    /// Also publish findings as alert events.
    pub alerts: bool,
}

impl Default for SupervisorSection {
    fn default() -> Self {
        let limits = SupervisorLimits::default();
        Self {
            light_min: limits.light_min,
            light_max: limits.light_max,
            temp_min: limits.temp_min,
            temp_max: limits.temp_max,
            alerts: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareSection {
    pub backend: Backend,
    pub light_path: PathBuf,
    pub thermal_zone: PathBuf,
    /// `brightness` file of the status LED.  Derived from `indicator.led`
    /// when unset, e.g. `/sys/class/leds/green2/brightness`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub led_path: Option<PathBuf>,
}

impl Default for HardwareSection {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            light_path: PathBuf::from(DEFAULT_ILLUMINANCE),
            thermal_zone: PathBuf::from(DEFAULT_THERMAL_ZONE),
            led_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherSection {
    /// `"stdout"` or the path of a file that receives one JSON event per line.
    pub sink: String,
    pub source: String,
}

impl Default for PublisherSection {
    fn default() -> Self {
        Self {
            sink: "stdout".to_string(),
            source: "vigil-node".to_string(),
        }
    }
}

/// Full node configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingSection,
    pub indicator: IndicatorSection,
    pub scheduling: SchedulingSection,
    pub supervisor: SupervisorSection,
    pub hardware: HardwareSection,
    pub publisher: PublisherSection,
}

// ─────────────────────────────────────────────────────────────────────────────
// Derived values
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Reject values the node cannot boot with.
    ///
    /// # Errors
    ///
    /// [`NodeError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), NodeError> {
        for (field, ms) in [
            ("sampling.light_period_ms", self.sampling.light_period_ms),
            ("sampling.internal_temp_period_ms", self.sampling.internal_temp_period_ms),
            ("indicator.blink_period_ms", self.indicator.blink_period_ms),
        ] {
            if ms == 0 {
                return Err(NodeError::Config(format!("{field} must be greater than zero")));
            }
        }
        self.status_led()?;
        self.priority_table()
            .check_order()
            .map_err(|e| NodeError::Config(format!("scheduling.priorities: {e}")))?;
        let s = &self.supervisor;
        if s.light_min > s.light_max || s.temp_min > s.temp_max {
            return Err(NodeError::Config(
                "supervisor limits: min must not exceed max".to_string(),
            ));
        }
        if self.publisher.sink.trim().is_empty() {
            return Err(NodeError::Config("publisher.sink must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn status_led(&self) -> Result<LedId, NodeError> {
        self.indicator.led.parse()
    }

    /// Sysfs `brightness` file driving the status LED.
    pub fn led_path(&self) -> Result<PathBuf, NodeError> {
        if let Some(path) = &self.hardware.led_path {
            return Ok(path.clone());
        }
        let led = self.status_led()?;
        Ok(PathBuf::from("/sys/class/leds")
            .join(led.label().to_ascii_lowercase())
            .join("brightness"))
    }

    pub fn priority_table(&self) -> PriorityTable {
        let p = &self.scheduling.priorities;
        PriorityTable {
            supervisor: p.supervisor,
            publisher: p.publisher,
            led: p.led,
            light_sensor: p.light_sensor,
            internal_temp: p.internal_temp,
        }
    }

    pub fn node_settings(&self) -> NodeSettings {
        let s = &self.supervisor;
        NodeSettings {
            light_period: Duration::from_millis(self.sampling.light_period_ms),
            internal_temp_period: Duration::from_millis(self.sampling.internal_temp_period_ms),
            blink_period: Duration::from_millis(self.indicator.blink_period_ms),
            limits: SupervisorLimits {
                light_min: s.light_min,
                light_max: s.light_max,
                temp_min: s.temp_min,
                temp_max: s.temp_max,
            },
            source: self.publisher.source.clone(),
        }
    }

    /// File sink path, or `None` when publishing to stdout.
    pub fn sink_path(&self) -> Option<&Path> {
        let sink = self.publisher.sink.trim();
        (!sink.eq_ignore_ascii_case("stdout")).then(|| Path::new(sink))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

/// `$VIGIL_CONFIG` when set, otherwise `~/.vigil/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(explicit) = std::env::var("VIGIL_CONFIG") {
        return PathBuf::from(explicit);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".vigil").join("config.toml")
}

/// Load the file at `path`, apply `VIGIL_*` overrides and validate.
pub fn load(path: &Path) -> Result<Config, NodeError> {
    let mut cfg = load_from(path)?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(cfg)
}

/// Parse the file at `path`.  A missing file yields the defaults.
pub(crate) fn load_from(path: &Path) -> Result<Config, NodeError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        NodeError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    toml::from_str(&raw)
        .map_err(|e| NodeError::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Apply `VIGIL_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `VIGIL_SCHEDULING` | `scheduling.mode` |
/// | `VIGIL_BACKEND` | `hardware.backend` |
/// | `VIGIL_PUBLISH_SINK` | `publisher.sink` |
/// | `VIGIL_LIGHT_PERIOD_MS` | `sampling.light_period_ms` |
/// | `VIGIL_TEMP_PERIOD_MS` | `sampling.internal_temp_period_ms` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("VIGIL_SCHEDULING")
        && let Ok(mode) = v.parse()
    {
        cfg.scheduling.mode = mode;
    }
    if let Some(v) = lookup("VIGIL_BACKEND")
        && let Ok(backend) = v.parse()
    {
        cfg.hardware.backend = backend;
    }
    if let Some(v) = lookup("VIGIL_PUBLISH_SINK") {
        cfg.publisher.sink = v;
    }
    if let Some(v) = lookup("VIGIL_LIGHT_PERIOD_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.sampling.light_period_ms = ms;
    }
    if let Some(v) = lookup("VIGIL_TEMP_PERIOD_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.sampling.internal_temp_period_ms = ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().expect("defaults must validate");
        assert_eq!(cfg.priority_table(), PriorityTable::default());
        assert_eq!(cfg.status_led().unwrap(), LedId::Red1);
        assert_eq!(cfg.node_settings().blink_period, vigil_hal::BLINK_LED_PERIOD);
        assert!(cfg.sink_path().is_none());
    }

    #[test]
    fn config_path_is_under_dot_vigil() {
        let path = config_path_for_home("/home/node");
        assert_eq!(path, PathBuf::from("/home/node/.vigil/config.toml"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let cfg = load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[scheduling]
mode = "fifo"
stack_size = 131072

[scheduling.priorities]
supervisor = 20

[indicator]
led = "green2"

[publisher]
sink = "/var/log/vigil.jsonl"
"#,
        )
        .unwrap();

        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.scheduling.mode, SchedulingMode::Fifo);
        assert_eq!(cfg.scheduling.stack_size, Some(131072));
        assert_eq!(cfg.scheduling.priorities.supervisor, 20);
        assert_eq!(cfg.scheduling.priorities.publisher, 9);
        assert_eq!(cfg.status_led().unwrap(), LedId::Green2);
        assert_eq!(cfg.sink_path(), Some(Path::new("/var/log/vigil.jsonl")));
        assert_eq!(cfg.sampling, SamplingSection::default());
        cfg.validate().unwrap();
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scheduling]\nmode = \"round-robin\"\n").unwrap();
        assert!(matches!(load_from(&path), Err(NodeError::Config(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            env(&[
                ("VIGIL_SCHEDULING", "default"),
                ("VIGIL_BACKEND", "sysfs"),
                ("VIGIL_PUBLISH_SINK", "/tmp/out.jsonl"),
                ("VIGIL_LIGHT_PERIOD_MS", "250"),
                ("VIGIL_TEMP_PERIOD_MS", "2000"),
            ]),
        );
        assert_eq!(cfg.scheduling.mode, SchedulingMode::Default);
        assert_eq!(cfg.hardware.backend, Backend::Sysfs);
        assert_eq!(cfg.publisher.sink, "/tmp/out.jsonl");
        assert_eq!(cfg.sampling.light_period_ms, 250);
        assert_eq!(cfg.sampling.internal_temp_period_ms, 2000);
    }

    #[test]
    fn invalid_env_overrides_are_ignored() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            env(&[
                ("VIGIL_SCHEDULING", "sometimes"),
                ("VIGIL_BACKEND", "gpio"),
                ("VIGIL_LIGHT_PERIOD_MS", "fast"),
                ("VIGIL_TEMP_PERIOD_MS", "-5"),
            ]),
        );
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn led_path_follows_the_configured_led() {
        let mut cfg = Config::default();
        assert_eq!(
            cfg.led_path().unwrap(),
            PathBuf::from("/sys/class/leds/red1/brightness")
        );

        cfg.indicator.led = "GREEN2".to_string();
        assert_eq!(
            cfg.led_path().unwrap(),
            PathBuf::from("/sys/class/leds/green2/brightness")
        );

        cfg.hardware.led_path = Some(PathBuf::from("/sys/class/leds/board:status/brightness"));
        assert_eq!(
            cfg.led_path().unwrap(),
            PathBuf::from("/sys/class/leds/board:status/brightness")
        );
    }

    #[test]
    fn zero_period_is_rejected() {
        let mut cfg = Config::default();
        cfg.sampling.light_period_ms = 0;
        match cfg.validate() {
            Err(NodeError::Config(msg)) => assert!(msg.contains("light_period_ms")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn out_of_order_priorities_are_rejected() {
        let mut cfg = Config::default();
        cfg.scheduling.priorities.internal_temp = cfg.scheduling.priorities.light_sensor;
        assert!(matches!(cfg.validate(), Err(NodeError::Config(_))));
    }

    #[test]
    fn unknown_led_and_inverted_limits_are_rejected() {
        let mut cfg = Config::default();
        cfg.indicator.led = "BLUE9".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.supervisor.temp_min = 100.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut cfg = Config::default();
        cfg.hardware.backend = Backend::Sysfs;
        let raw = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&raw).unwrap();
        assert_eq!(back, cfg);
    }
}
