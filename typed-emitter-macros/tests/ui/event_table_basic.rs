use typed_emitter::{Event, EventTable, TypedEmitter, event_table};

#[event_table]
#[derive(Debug, Clone, PartialEq)]
pub enum DoorEvents {
    Opened,
    #[event(name = "door.knock")]
    Knock(String, u8),
    #[event(error)]
    Jammed(String),
}

#[event_table(module = bell)]
pub enum BellEvents {
    Ring(u32),
}

#[event_table]
pub enum NoEvents {}

fn main() {
    assert_eq!(<door_events::Knock as Event>::NAME, "door.knock");
    assert!(<door_events::Jammed as Event>::ERROR_CHANNEL);
    assert_eq!(DoorEvents::NAMES, &["opened", "door.knock", "jammed"]);

    let door = TypedEmitter::<DoorEvents>::new();
    door.subscribe::<door_events::Knock>(|(who, times): &(String, u8)| {
        let _ = (who, times);
    });
    assert!(door.emit(DoorEvents::Knock("postman".into(), 2)));

    let bell = TypedEmitter::<BellEvents>::new();
    assert!(!bell.publish::<bell::Ring>((1,)));

    assert!(NoEvents::NAMES.is_empty());
}
