//! Registry Tests
//!
//! Covers:
//! - Registration order and sibling-safe removal
//! - Global dispatch fan-out with a shared event value
//! - Removal during an in-flight dispatch

use std::sync::{Arc, Mutex};
use wsmock::intercept::{Context, Registry};
use wsmock::ws::{Event, EventType, Message};

const URL: &str = "ws://localhost:8080/chat";

#[test]
fn test_lookup_in_registration_order() {
    let ctx = Context::isolated();
    ctx.link(URL);

    let a = ctx.connect(URL).unwrap();
    let b = ctx.connect(URL).unwrap();
    let c = ctx.connect(URL).unwrap();

    assert_eq!(ctx.registry().lookup_sockets(URL), vec![a, b, c]);
}

#[test]
fn test_remove_keeps_siblings() {
    let ctx = Context::isolated();
    ctx.link(URL);
    let a = ctx.connect(URL).unwrap();
    let b = ctx.connect(URL).unwrap();
    ctx.run_until_idle();

    a.close().unwrap();

    assert_eq!(ctx.registry().lookup_sockets(URL), vec![b.clone()]);

    // Removing a client that is not registered changes nothing.
    ctx.registry().remove_socket(&a, URL);
    assert_eq!(ctx.registry().lookup_sockets(URL), vec![b]);
}

#[test]
fn test_remove_matches_destination() {
    let ctx = Context::isolated();
    let ws = ctx.connect(URL).unwrap();

    ctx.registry().remove_socket(&ws, "ws://elsewhere/");
    assert_eq!(ctx.registry().socket_count(), 1);

    ctx.registry().remove_socket(&ws, URL);
    assert_eq!(ctx.registry().socket_count(), 0);
}

#[test]
fn test_dispatch_global_event_reaches_all_in_order() {
    let ctx = Context::isolated();
    ctx.link(URL);
    let first = ctx.connect(URL).unwrap();
    let second = ctx.connect(URL).unwrap();
    ctx.run_until_idle();

    let log: Arc<Mutex<Vec<(&'static str, Event)>>> = Arc::new(Mutex::new(Vec::new()));
    for (name, ws) in [("first", &first), ("second", &second)] {
        let log = Arc::clone(&log);
        ws.add_event_listener(EventType::Message, move |ev| {
            log.lock().unwrap().push((name, ev.clone()));
        });
    }

    let delivered = ctx
        .registry()
        .dispatch_global_event(URL, EventType::Message, Message::from("payload"));
    assert_eq!(delivered, 2);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].0, "first");
    assert_eq!(log[1].0, "second");
    assert_eq!(log[0].1, log[1].1);
    assert_eq!(log[0].1.data(), Some(&Message::from("payload")));
}

#[test]
fn test_dispatch_shares_one_event_value() {
    let ctx = Context::isolated();
    ctx.link(URL);
    let first = ctx.connect(URL).unwrap();
    let second = ctx.connect(URL).unwrap();
    ctx.run_until_idle();

    let seen = Arc::new(Mutex::new(Vec::new()));
    for ws in [&first, &second] {
        let seen = Arc::clone(&seen);
        ws.add_event_listener(EventType::Message, move |ev| {
            seen.lock().unwrap().push(ev as *const Event as usize);
        });
    }

    ctx.registry()
        .dispatch_global_event(URL, EventType::Message, Message::from("x"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], seen[1]);
}

#[test]
fn test_close_during_dispatch_does_not_skip_siblings() {
    let ctx = Context::isolated();
    ctx.link(URL);
    let first = ctx.connect(URL).unwrap();
    let second = ctx.connect(URL).unwrap();
    ctx.run_until_idle();

    // The first client closes its sibling while the dispatch is in flight.
    let sibling = second.clone();
    first.add_event_listener(EventType::Message, move |_| {
        sibling.close().unwrap();
    });
    let hits = Arc::new(Mutex::new(0));
    let h = Arc::clone(&hits);
    second.add_event_listener(EventType::Message, move |_| *h.lock().unwrap() += 1);

    let delivered = ctx
        .registry()
        .dispatch_global_event(URL, EventType::Message, Message::from("x"));

    // The snapshot still included the sibling.
    assert_eq!(delivered, 2);
    assert_eq!(*hits.lock().unwrap(), 1);

    // The next dispatch consults the registry afresh.
    ctx.registry()
        .dispatch_global_event(URL, EventType::Message, Message::from("y"));
    assert_eq!(*hits.lock().unwrap(), 1);
}

#[test]
fn test_shared_registry_between_contexts() {
    let registry = Arc::new(Registry::new());
    let bridge = wsmock::intercept::Bridge::new();
    let a = Context::with_registry(&bridge, Arc::clone(&registry));
    let b = Context::with_registry(&bridge, Arc::clone(&registry));

    a.link(URL);
    let ws = b.connect(URL).unwrap();
    b.run_until_idle();

    assert_eq!(ws.ready_state(), wsmock::base::ReadyState::Open);
    assert_eq!(registry.socket_count(), 1);
}
