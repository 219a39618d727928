//! `vigild` – monitoring node daemon.
//!
//! Boots the node and then stays out of the way:
//!
//! 1. Initialises logging (see [`vigil_runtime::telemetry`]).
//! 2. Loads `~/.vigil/config.toml` (or `$VIGIL_CONFIG`) plus `VIGIL_*`
//!    overrides.
//! 3. Selects the scheduling class, builds the board and the publish sink.
//! 4. Hands the thread bodies to the orchestrator, which raises itself,
//!    starts both consumers, waits for their readiness and only then starts
//!    the LED indicator and the producers.
//! 5. Blocks for the lifetime of the process.
//!
//! Any boot failure, and any node thread ending or panicking afterwards, is
//! fatal: it is logged and the process exits with status 1.  Restarting is
//! left to whatever supervises the process.
//!
//! Measurement events go to stdout (or the configured file) as JSON lines;
//! everything human-readable goes to stderr.

mod config;

use colored::Colorize;
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use config::{Backend, Config};
use vigil_hal::Board;
use vigil_hal::sysfs::{SysfsLed, SysfsLightSensor, SysfsTemperatureSensor};
use vigil_kernel::{NodeContext, Orchestrator, ThreadSpawner, select_scheduler};
use vigil_middleware::{JsonLinesTransport, Transport};
use vigil_runtime::assemble;
use vigil_runtime::telemetry::{self, TracerProviderGuard};
use vigil_types::NodeError;

/// How often the main thread checks that every node thread is still alive.
const LIVENESS_POLL: Duration = Duration::from_secs(1);

fn main() {
    let guard = telemetry::init_tracing("vigild");
    install_panic_hook();
    print_banner();

    match run(&config::config_path()) {
        Ok(never) => match never {},
        Err(e) => fatal(guard, e),
    }
}

/// Boot the node from the config at `config_file` and block.  Only ever
/// returns an error, which the caller treats as fatal.
fn run(config_file: &Path) -> Result<Infallible, NodeError> {
    let cfg = config::load(config_file)?;
    info!(
        path = %config_file.display(),
        scheduling = %cfg.scheduling.mode,
        backend = %cfg.hardware.backend,
        sink = %cfg.publisher.sink,
        "configuration loaded"
    );

    let scheduler = select_scheduler(cfg.scheduling.mode)?;
    let board = build_board(&cfg)?;
    let transport = build_transport(&cfg)?;
    let alerts = if cfg.supervisor.alerts {
        Some(build_transport(&cfg)?)
    } else {
        None
    };

    let mut spawner = ThreadSpawner::new(Arc::clone(&scheduler));
    if let Some(bytes) = cfg.scheduling.stack_size {
        spawner = spawner.with_stack_size(bytes);
    }
    let orchestrator = Orchestrator::new(cfg.priority_table(), scheduler, Box::new(spawner));
    let tasks = assemble(board, transport, alerts, cfg.node_settings());

    let node = orchestrator.launch(Arc::new(NodeContext::new()), tasks)?;
    info!(threads = ?node.roles(), "node running");
    Err(node.wait(LIVENESS_POLL))
}

fn build_board(cfg: &Config) -> Result<Board, NodeError> {
    let led = cfg.status_led()?;
    let hw = &cfg.hardware;
    Ok(match hw.backend {
        Backend::Sim => vigil_hal::sim::board_with_led(led),
        Backend::Sysfs => Board {
            light: Box::new(SysfsLightSensor::new(hw.light_path.clone())),
            internal_temp: Box::new(SysfsTemperatureSensor::new(hw.thermal_zone.clone())),
            status_led: Box::new(SysfsLed::new(led, cfg.led_path()?)),
        },
    })
}

fn build_transport(cfg: &Config) -> Result<Box<dyn Transport>, NodeError> {
    let transport: Box<dyn Transport> = match cfg.sink_path() {
        None => Box::new(JsonLinesTransport::stdout()),
        Some(path) => Box::new(JsonLinesTransport::append_to(path)?),
    };
    Ok(transport)
}

// ── Fatal policy ─────────────────────────────────────────────────────────────

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");
        error!(thread = name, panic = %info, "node thread panicked");
        eprintln!("{} thread '{name}' panicked: {info}", "vigild: fatal:".red().bold());
        std::process::exit(1);
    }));
}

fn fatal(guard: TracerProviderGuard, err: NodeError) -> ! {
    error!(error = %err, "aborting");
    eprintln!("{} {err}", "vigild: fatal:".red().bold());
    // `exit` skips destructors; flush pending spans first.
    drop(guard);
    std::process::exit(1);
}

fn print_banner() {
    eprintln!(
        "{} {}",
        "vigild".bold().cyan(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use vigil_hal::{Led, LedId};

    fn boot_with(contents: &str) -> Result<Infallible, NodeError> {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        run(&path)
    }

    #[test]
    fn malformed_config_aborts_boot() {
        match boot_with("[sampling\nlight_period_ms = 5\n") {
            Err(NodeError::Config(msg)) => assert!(msg.contains("config.toml")),
            Err(other) => panic!("expected Config error, got {other}"),
            Ok(never) => match never {},
        }
    }

    #[test]
    fn invalid_config_aborts_boot_before_any_thread() {
        assert!(matches!(
            boot_with("[indicator]\nblink_period_ms = 0\n"),
            Err(NodeError::Config(_))
        ));
    }

    #[test]
    fn unopenable_sink_aborts_boot() {
        assert!(matches!(
            boot_with(
                "[scheduling]\nmode = \"default\"\n\n[publisher]\nsink = \"/nonexistent/dir/out.jsonl\"\n"
            ),
            Err(NodeError::Transport(_))
        ));
    }

    #[test]
    fn sysfs_board_drives_the_configured_led() {
        let mut cfg = Config::default();
        cfg.hardware.backend = Backend::Sysfs;
        cfg.indicator.led = "GREEN1".to_string();
        let board = build_board(&cfg).unwrap();
        assert_eq!(board.status_led.id(), LedId::Green1);
    }
}
