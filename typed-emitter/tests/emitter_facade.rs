mod common;

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use common::capture_logs;
use tracing::Level;
use typed_emitter::{EmitterOptions, EventKey, Listener, TypedEmitter, event_table};

#[event_table]
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvents {
    Tick(u64),
    #[event(name = "user.joined")]
    Joined(String, u32),
    Closed,
    #[event(error)]
    Failure(String),
}

use room_events::{Closed, Failure, Joined, Tick};

type Log = Arc<Mutex<Vec<String>>>;

fn make_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn tick_logger(log: &Log, tag: &'static str) -> Listener<(u64,)> {
    let log = Arc::clone(log);
    Listener::new(move |(n,): &(u64,)| log.lock().unwrap().push(format!("{tag}:{n}")))
}

#[test]
fn tick_scenario_subscribe_publish_count_and_clear() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    let log = make_log();

    emitter.subscribe::<Tick>(tick_logger(&log, "f"));
    assert!(emitter.publish::<Tick>((5,)));
    assert_eq!(*log.lock().unwrap(), vec!["f:5"]);
    assert_eq!(emitter.listener_count_for::<Tick>(), 1);

    emitter.unsubscribe_all();
    assert_eq!(emitter.listener_count_for::<Tick>(), 0);
    assert!(!emitter.publish::<Tick>((6,)));
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn publish_calls_every_listener_once_in_registration_order() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    let log = make_log();

    emitter
        .subscribe::<Tick>(tick_logger(&log, "a"))
        .subscribe::<Tick>(tick_logger(&log, "b"))
        .subscribe::<Tick>(tick_logger(&log, "c"));

    emitter.publish::<Tick>((1,));

    assert_eq!(*log.lock().unwrap(), vec!["a:1", "b:1", "c:1"]);
}

#[test]
fn publish_without_listeners_returns_false() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    assert!(!emitter.publish::<Closed>(()));
}

#[test]
fn multi_argument_events_receive_the_whole_tuple() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    let log = make_log();
    let l = Arc::clone(&log);

    emitter.subscribe::<Joined>(move |(name, seat): &(String, u32)| {
        l.lock().unwrap().push(format!("{name}@{seat}"));
    });
    emitter.publish::<Joined>(("ada".to_string(), 7));

    assert_eq!(*log.lock().unwrap(), vec!["ada@7"]);
}

#[test]
fn subscribe_once_fires_only_on_first_publish() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    let log = make_log();

    emitter.subscribe_once::<Tick>(tick_logger(&log, "once"));
    assert_eq!(emitter.listener_count_for::<Tick>(), 1);

    assert!(emitter.publish::<Tick>((1,)));
    assert!(!emitter.publish::<Tick>((2,)));

    assert_eq!(*log.lock().unwrap(), vec!["once:1"]);
    assert_eq!(emitter.listener_count_for::<Tick>(), 0);
}

#[test]
fn once_listener_is_not_repeated_by_reentrant_publish() {
    let emitter = Arc::new(TypedEmitter::<RoomEvents>::new());
    let log = make_log();

    {
        let inner = Arc::clone(&emitter);
        let log = Arc::clone(&log);
        emitter.subscribe_once::<Tick>(move |(n,): &(u64,)| {
            log.lock().unwrap().push(format!("once:{n}"));
            inner.publish::<Tick>((n + 1,));
        });
    }

    emitter.publish::<Tick>((1,));
    assert_eq!(*log.lock().unwrap(), vec!["once:1"]);
}

#[test]
fn prepend_listeners_run_before_existing_ones() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    let log = make_log();

    emitter
        .subscribe::<Tick>(tick_logger(&log, "plain"))
        .prepend_listener::<Tick>(tick_logger(&log, "first"))
        .prepend_once_listener::<Tick>(tick_logger(&log, "zeroth"));

    emitter.publish::<Tick>((1,));
    emitter.publish::<Tick>((2,));

    assert_eq!(
        *log.lock().unwrap(),
        vec!["zeroth:1", "first:1", "plain:1", "first:2", "plain:2"]
    );
}

#[test]
fn unsubscribe_removes_by_identity_latest_first() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    let log = make_log();
    let shared = tick_logger(&log, "shared");
    let other = tick_logger(&log, "other");

    emitter
        .subscribe::<Tick>(shared.clone())
        .subscribe::<Tick>(other.clone())
        .subscribe::<Tick>(shared.clone());

    emitter.unsubscribe::<Tick>(&shared);
    let remaining = emitter.listeners_for::<Tick>();
    assert_eq!(remaining, vec![shared.clone(), other.clone()]);

    // 另一个同形状但不同身份的监听器不会被误删
    emitter.unsubscribe::<Tick>(&tick_logger(&log, "shared"));
    assert_eq!(emitter.listener_count_for::<Tick>(), 2);

    // 对不存在的监听器退订是安全的
    emitter.unsubscribe::<Tick>(&shared).unsubscribe::<Tick>(&shared);
    assert_eq!(emitter.listeners_for::<Tick>(), vec![other]);
}

#[test]
fn unsubscribe_matches_the_inner_listener_of_once_wrappers() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    let log = make_log();
    let listener = tick_logger(&log, "x");

    emitter.subscribe_once::<Tick>(listener.clone());
    emitter.unsubscribe::<Tick>(&listener);
    emitter.publish::<Tick>((1,));

    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn unsubscribe_all_for_only_clears_one_event() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    emitter
        .subscribe::<Tick>(|_: &(u64,)| {})
        .subscribe::<Closed>(|_: &()| {});

    emitter.unsubscribe_all_for::<Tick>();

    assert_eq!(emitter.listener_count_for::<Tick>(), 0);
    assert_eq!(emitter.listener_count_for::<Closed>(), 1);
}

#[test]
fn raw_listeners_expose_once_wrappers() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    let log = make_log();
    let persistent = tick_logger(&log, "p");
    let once = tick_logger(&log, "o");

    emitter
        .subscribe::<Tick>(persistent.clone())
        .subscribe_once::<Tick>(once.clone());

    let raw = emitter.raw_listeners::<Tick>();
    assert_eq!(raw.len(), 2);
    assert!(!raw[0].is_once());
    assert!(raw[1].is_once());
    assert_eq!(raw[1].listener(), &once);

    // listeners_for 返回解开后的原始监听器
    assert_eq!(emitter.listeners_for::<Tick>(), vec![persistent, once]);

    emitter.publish::<Tick>((1,));
    assert!(raw[1].has_fired());
    assert_eq!(emitter.raw_listeners::<Tick>().len(), 1);
}

#[test]
fn event_names_follow_first_registration_and_drop_empty_events() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    assert!(emitter.event_names().is_empty());

    let closed = Listener::new(|_: &()| {});
    emitter
        .subscribe::<Closed>(closed.clone())
        .subscribe::<Tick>(|_: &(u64,)| {})
        .subscribe::<Joined>(|_: &(String, u32)| {});

    let names: Vec<&str> = emitter.event_names().iter().map(|k| k.name()).collect();
    assert_eq!(names, vec!["closed", "tick", "user.joined"]);
    assert!(emitter.event_names()[0].is::<Closed>());
    assert_eq!(emitter.event_names()[1], EventKey::of::<Tick>());

    emitter.unsubscribe::<Closed>(&closed);
    let names: Vec<String> = emitter.event_names().iter().map(|k| k.to_string()).collect();
    assert_eq!(names, vec!["tick", "user.joined"]);
}

#[test]
fn listener_added_during_publish_waits_for_next_round() {
    let emitter = Arc::new(TypedEmitter::<RoomEvents>::new());
    let log = make_log();

    {
        let inner = Arc::clone(&emitter);
        let log = Arc::clone(&log);
        emitter.subscribe_once::<Tick>(move |_: &(u64,)| {
            log.lock().unwrap().push("outer".into());
            let log = Arc::clone(&log);
            inner.subscribe::<Tick>(move |(n,): &(u64,)| {
                log.lock().unwrap().push(format!("added:{n}"));
            });
        });
    }

    emitter.publish::<Tick>((1,));
    assert_eq!(*log.lock().unwrap(), vec!["outer"]);

    emitter.publish::<Tick>((2,));
    assert_eq!(*log.lock().unwrap(), vec!["outer", "added:2"]);
}

#[test]
fn listener_removed_during_publish_still_runs_this_round() {
    let emitter = Arc::new(TypedEmitter::<RoomEvents>::new());
    let log = make_log();
    let second = tick_logger(&log, "second");

    {
        let inner = Arc::clone(&emitter);
        let second = second.clone();
        let log = Arc::clone(&log);
        emitter.subscribe::<Tick>(move |(n,): &(u64,)| {
            log.lock().unwrap().push(format!("first:{n}"));
            inner.unsubscribe::<Tick>(&second);
        });
    }
    emitter.subscribe::<Tick>(second);

    emitter.publish::<Tick>((1,));
    emitter.publish::<Tick>((2,));

    assert_eq!(
        *log.lock().unwrap(),
        vec!["first:1", "second:1", "first:2"]
    );
}

#[test]
fn exceeding_max_listeners_warns_once_and_still_registers() {
    let emitter =
        TypedEmitter::<RoomEvents>::with_options(EmitterOptions::builder().max_listeners(2).build());
    assert_eq!(emitter.max_listeners(), 2);

    let ((), logs) = capture_logs(Level::WARN, || {
        for _ in 0..5 {
            emitter.subscribe::<Tick>(|_: &(u64,)| {});
        }
    });
    assert_eq!(emitter.listener_count_for::<Tick>(), 5);
    assert_eq!(logs.matches("max listeners exceeded").count(), 1);
    assert!(logs.contains("tick"));

    emitter.set_max_listeners(0);
    assert_eq!(emitter.max_listeners(), 0);
    let ((), logs) = capture_logs(Level::WARN, || {
        emitter.subscribe::<Closed>(|_: &()| {});
    });
    assert!(logs.is_empty());
}

#[test]
fn emit_routes_enum_values_to_their_events() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    let log = make_log();

    emitter.subscribe::<Tick>(tick_logger(&log, "tick"));
    {
        let log = Arc::clone(&log);
        emitter.subscribe::<Joined>(move |(name, seat): &(String, u32)| {
            log.lock().unwrap().push(format!("joined:{name}:{seat}"));
        });
    }

    assert!(emitter.emit(RoomEvents::Tick(3)));
    assert!(emitter.emit(RoomEvents::Joined("bob".into(), 2)));
    assert!(!emitter.emit(RoomEvents::Closed));

    assert_eq!(*log.lock().unwrap(), vec!["tick:3", "joined:bob:2"]);
}

#[test]
fn error_channel_requires_a_listener() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    assert!(emitter.try_publish::<Failure>(("boom".into(),)).is_err());

    let log = make_log();
    let l = Arc::clone(&log);
    emitter.subscribe::<Failure>(move |(reason,): &(String,)| {
        l.lock().unwrap().push(reason.clone());
    });

    assert_eq!(emitter.try_publish::<Failure>(("boom".into(),)), Ok(true));
    assert!(emitter.emit(RoomEvents::Failure("again".into())));
    assert_eq!(*log.lock().unwrap(), vec!["boom", "again"]);
}

#[test]
#[should_panic(expected = "listener exploded")]
fn listener_panic_propagates_to_publisher() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    emitter.subscribe::<Closed>(Listener::new(|_: &()| panic!("listener exploded")));
    emitter.publish::<Closed>(());
}

#[test]
fn listener_panic_skips_the_rest_of_the_round() {
    let emitter = TypedEmitter::<RoomEvents>::new();
    let log = make_log();
    let l = Arc::clone(&log);

    emitter
        .subscribe::<Closed>(Listener::new(|_: &()| panic!("listener exploded")))
        .subscribe::<Closed>(move |_: &()| l.lock().unwrap().push("after".into()));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| emitter.publish::<Closed>(())));

    assert!(outcome.is_err());
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(emitter.listener_count_for::<Closed>(), 2);
}

#[test]
fn table_lists_declared_names() {
    use typed_emitter::EventTable;
    assert_eq!(
        RoomEvents::NAMES,
        &["tick", "user.joined", "closed", "failure"]
    );
}
