use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use typed_emitter::{
    Emitter, EmitterOptions, Listener, TypedEmitter, construct, event_table, listeners,
};

/// 传感器读数，单位 0.1 摄氏度
type Tenths = i32;

#[event_table]
#[derive(Debug, Clone)]
enum ThermostatEvents {
    Sample(Tenths),
    #[event(name = "threshold.crossed")]
    Crossed(Tenths, Tenths),
    Shutdown,
    #[event(error)]
    Fault(String),
}

use thermostat_events::{Crossed, Fault, Shutdown};

struct Thermostat {
    events: TypedEmitter<ThermostatEvents>,
    threshold: Tenths,
}

impl Emitter for Thermostat {
    type Events = ThermostatEvents;

    fn emitter(&self) -> &TypedEmitter<ThermostatEvents> {
        &self.events
    }
}

#[listeners]
impl Thermostat {
    #[on(thermostat_events::Sample)]
    fn check(&self, value: &Tenths) {
        tracing::info!(value, "reading");
        if *value > self.threshold {
            self.events.emit(ThermostatEvents::Crossed(*value, self.threshold));
        }
    }

    #[on(Fault)]
    fn log_fault(&self, reason: &String) {
        tracing::error!(%reason, "sensor fault");
    }

    #[once(Shutdown)]
    fn farewell(thermostat: &Arc<Self>) {
        tracing::info!(
            events = ?thermostat.events,
            "thermostat shutting down"
        );
        thermostat.events.unsubscribe_all();
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let thermostat = construct(Thermostat {
        events: TypedEmitter::with_options(EmitterOptions::builder().max_listeners(4).build()),
        threshold: 250,
    });

    let alarm = Listener::new(|(value, limit): &(Tenths, Tenths)| {
        tracing::warn!(value, limit, "threshold crossed");
    });
    thermostat.events.subscribe::<Crossed>(alarm.clone());

    for value in [212, 238, 261, 244] {
        thermostat.events.emit(ThermostatEvents::Sample(value));
    }

    let handled = thermostat
        .events
        .emit(ThermostatEvents::Fault("probe disconnected".to_string()));
    anyhow::ensure!(handled, "fault event was not handled");

    thermostat.events.unsubscribe::<Crossed>(&alarm);
    let names: Vec<String> = thermostat
        .events
        .event_names()
        .iter()
        .map(|key| key.to_string())
        .collect();
    tracing::info!(?names, "active events");

    thermostat.events.emit(ThermostatEvents::Shutdown);
    anyhow::ensure!(thermostat.events.event_names().is_empty());
    Ok(())
}
