//! [`assemble`] – wire drivers and transports into thread bodies.

use std::sync::Arc;
use std::time::Duration;

use vigil_hal::{BLINK_LED_PERIOD, Board};
use vigil_kernel::{NodeContext, NodeTasks};
use vigil_middleware::Transport;

use crate::indicator::Blinker;
use crate::producer::{Measurand, Producer};
use crate::publisher::Publisher;
use crate::supervisor::{Supervisor, SupervisorLimits};

/// Runtime knobs of the thread bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSettings {
    pub light_period: Duration,
    pub internal_temp_period: Duration,
    pub blink_period: Duration,
    pub limits: SupervisorLimits,
    /// `source` field of every published event.
    pub source: String,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            light_period: Duration::from_millis(500),
            internal_temp_period: Duration::from_millis(1000),
            blink_period: BLINK_LED_PERIOD,
            limits: SupervisorLimits::default(),
            source: "vigil-node".to_string(),
        }
    }
}

/// Build the five thread bodies.
///
/// Each driver of `board` moves into the thread that owns it.  `alerts`, when
/// given, receives the supervisor's findings.
pub fn assemble(
    board: Board,
    transport: Box<dyn Transport>,
    alerts: Option<Box<dyn Transport>>,
    settings: NodeSettings,
) -> NodeTasks {
    let mut supervisor = Supervisor::new(settings.limits);
    if let Some(sink) = alerts {
        supervisor = supervisor.with_alert_sink(sink);
    }
    let publisher = Publisher::new(transport, settings.source);
    let blinker = Blinker::new(board.status_led, settings.blink_period);
    let light = Producer::new(Measurand::Light, board.light, settings.light_period);
    let temp = Producer::new(
        Measurand::InternalTemp,
        board.internal_temp,
        settings.internal_temp_period,
    );

    NodeTasks {
        supervisor: Box::new(move |ctx: Arc<NodeContext>| supervisor.run(ctx)),
        publisher: Box::new(move |ctx: Arc<NodeContext>| publisher.run(ctx)),
        led: Box::new(move |ctx: Arc<NodeContext>| blinker.run(ctx)),
        light_sensor: Box::new(move |ctx: Arc<NodeContext>| light.run(ctx)),
        internal_temp: Box::new(move |ctx: Arc<NodeContext>| temp.run(ctx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;
    use vigil_hal::LedId;
    use vigil_hal::sim::{SimLed, SimLightSensor, SimTemperatureSensor};
    use vigil_kernel::{DefaultScheduler, Orchestrator, PriorityTable, Scheduler, ThreadSpawner};
    use vigil_middleware::{BusTransport, EventBus, Topic};
    use vigil_types::{EventPayload, ThreadRole};

    fn fast_settings() -> NodeSettings {
        NodeSettings {
            light_period: Duration::from_millis(5),
            internal_temp_period: Duration::from_millis(7),
            blink_period: Duration::from_millis(5),
            source: "e2e".to_string(),
            ..NodeSettings::default()
        }
    }

    #[test]
    fn default_settings_use_board_blink_period() {
        assert_eq!(NodeSettings::default().blink_period, BLINK_LED_PERIOD);
    }

    #[test]
    fn simulated_node_publishes_and_blinks() {
        let led = SimLed::new(LedId::Green2);
        let probe = led.probe();
        let board = Board {
            light: Box::new(SimLightSensor::default()),
            internal_temp: Box::new(SimTemperatureSensor::default()),
            status_led: Box::new(led),
        };
        let bus = EventBus::new(256);
        let mut measurements = bus.subscribe_to(Topic::Measurements);
        let tasks = assemble(
            board,
            Box::new(BusTransport::new(bus.clone())),
            Some(Box::new(BusTransport::new(bus))),
            fast_settings(),
        );

        let scheduler: Arc<dyn Scheduler> = Arc::new(DefaultScheduler);
        let orchestrator = Orchestrator::new(
            PriorityTable::default(),
            Arc::clone(&scheduler),
            Box::new(ThreadSpawner::new(scheduler)),
        );
        let node = orchestrator
            .launch(Arc::new(NodeContext::new()), tasks)
            .unwrap();
        assert_eq!(
            node.roles(),
            vec![
                ThreadRole::Supervisor,
                ThreadRole::Publisher,
                ThreadRole::Led,
                ThreadRole::LightSensor,
                ThreadRole::InternalTemp,
            ]
        );

        let deadline = Instant::now() + Duration::from_secs(3);
        let (mut light, mut temp) = (false, false);
        while !(light && temp) && Instant::now() < deadline {
            match measurements.try_recv() {
                Ok(event) => {
                    assert_eq!(event.source, "e2e");
                    if let EventPayload::Measurement(r) = event.payload {
                        light |= r.light.is_some();
                        temp |= r.internal_temp.is_some();
                    }
                }
                Err(_) => thread::sleep(Duration::from_millis(2)),
            }
        }
        assert!(light, "no light measurement published");
        assert!(temp, "no temperature measurement published");

        while probe.toggles() < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert!(probe.toggles() >= 2);
    }
}
