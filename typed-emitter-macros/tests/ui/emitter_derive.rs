use typed_emitter::{Emitter, TypedEmitter, event_table};

#[event_table]
pub enum LampEvents {
    Toggle(bool),
}

#[derive(Emitter, Default)]
struct Lamp {
    events: TypedEmitter<LampEvents>,
}

#[derive(Emitter, Default)]
struct Wrapped(#[emitter(deref)] TypedEmitter<LampEvents>);

#[derive(Emitter, Default)]
struct Pair {
    primary: TypedEmitter<LampEvents>,
    #[emitter]
    secondary: TypedEmitter<LampEvents>,
}

fn main() {
    let lamp = Lamp::default();
    lamp.emitter().subscribe::<lamp_events::Toggle>(|_: &(bool,)| {});
    assert_eq!(lamp.events.listener_count_for::<lamp_events::Toggle>(), 1);

    let wrapped = Wrapped::default();
    assert!(!wrapped.publish::<lamp_events::Toggle>((true,)));

    let pair = Pair::default();
    pair.emitter().subscribe::<lamp_events::Toggle>(|_: &(bool,)| {});
    assert_eq!(pair.secondary.listener_count_for::<lamp_events::Toggle>(), 1);
    assert_eq!(pair.primary.listener_count_for::<lamp_events::Toggle>(), 0);
}
