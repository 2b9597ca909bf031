use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use typed_emitter::{Emitter, Listeners, TypedEmitter, construct, event_table, listeners};

#[event_table]
pub enum PumpEvents {
    Start,
    Flow(u32, u32),
    Stop,
}

#[derive(Emitter, Default)]
struct Pump {
    #[emitter(deref)]
    events: TypedEmitter<PumpEvents>,
    litres: AtomicU32,
}

#[listeners]
impl Pump {
    #[on(pump_events::Flow)]
    fn measure(&self, rate: &u32, secs: &u32) {
        self.litres.fetch_add(rate * secs, Ordering::Relaxed);
    }

    #[once(pump_events::Start)]
    #[on(pump_events::Stop)]
    fn reset(&self) {
        self.litres.store(0, Ordering::Relaxed);
    }

    #[once(pump_events::Stop)]
    fn report(pump: &Arc<Self>) -> Result<(), String> {
        match pump.litres.load(Ordering::Relaxed) {
            0 => Ok(()),
            left => Err(format!("{left} litres unaccounted")),
        }
    }

    fn total(&self) -> u32 {
        self.litres.load(Ordering::Relaxed)
    }
}

fn main() {
    assert_eq!(Pump::subscriptions().len(), 4);

    let pump = construct(Pump::default());
    pump.publish::<pump_events::Start>(());
    pump.publish::<pump_events::Flow>((3, 4));
    assert_eq!(pump.total(), 12);
    pump.emit(PumpEvents::Stop);
    assert_eq!(pump.total(), 0);
}
