//! Tests for the mutation event layer.

extern crate ampule;

use std::cell::RefCell;
use std::rc::Rc;

use ampule::{Action, Error, Registry, Value};

/// Listener that records `action:path` strings.
fn recording(registry: &Registry, spec: &str) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    registry
        .listen(spec, move |action, path, _args| {
            log.borrow_mut().push(format!("{}:{}", action.name(), path));
        })
        .expect("listener spec should parse");
    seen
}

#[test]
fn test_add_event_carries_value() {
    let registry = Registry::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    registry
        .listen("add", move |_action, path, args| {
            log.borrow_mut().push((path.to_string(), args[0].clone()));
        })
        .unwrap();
    registry.add("data", Value::from("somedata")).unwrap();
    let events = seen.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "data");
    assert_eq!(events[0].1, Value::from("somedata"));
}

#[test]
fn test_set_and_get_events() {
    let registry = Registry::new();
    registry.add("data", Value::from(1i64)).unwrap();
    let sets = recording(&registry, "set");
    let gets = recording(&registry, "get");
    registry.set("data", Value::from(2i64)).unwrap();
    let _ = registry.get("data");
    let _ = registry.get("absent");
    assert_eq!(sets.borrow().as_slice(), ["set:data"]);
    assert_eq!(gets.borrow().as_slice(), ["get:data", "get:absent"]);
}

#[test]
fn test_remove_event_fires_even_when_absent() {
    let registry = Registry::new();
    let removes = recording(&registry, "remove");
    registry.remove("ghost");
    assert_eq!(removes.borrow().as_slice(), ["remove:ghost"]);
}

#[test]
fn test_remove_fires_no_set_event() {
    let registry = Registry::new();
    registry.add("a.b", Value::from(1i64)).unwrap();
    registry.add("a.c", Value::from(2i64)).unwrap();
    let sets = recording(&registry, "set");
    let removes = recording(&registry, "remove");
    registry.remove("a.b");
    assert!(sets.borrow().is_empty());
    assert_eq!(removes.borrow().as_slice(), ["remove:a.b"]);
    assert_eq!(registry.get("a.c"), Value::from(2i64));
}

#[test]
fn test_listops_event_carries_list_and_return() {
    let registry = Registry::new();
    registry
        .add("nums", Value::list_of(vec![Value::from(1i64)]))
        .unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    registry
        .listen("listops", move |_action, path, args| {
            let len = args[0].as_list().map(|l| l.borrow().len()).unwrap_or(0);
            log.borrow_mut()
                .push((path.to_string(), len, args[1].clone()));
        })
        .unwrap();
    registry
        .listops("nums", |items| {
            items.push(Value::from(2i64));
            Value::from("pushed")
        })
        .unwrap();
    let events = seen.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "nums");
    // The listener observes the already-mutated list.
    assert_eq!(events[0].1, 2);
    assert_eq!(events[0].2, Value::from("pushed"));
}

// ── Path filters ─────────────────────────────────────────────────────

#[test]
fn test_exact_path_filter() {
    let registry = Registry::new();
    let seen = recording(&registry, "add:user.name");
    registry.add("user.name", Value::from("a")).unwrap();
    registry.add("user.email", Value::from("b")).unwrap();
    assert_eq!(seen.borrow().as_slice(), ["add:user.name"]);
}

#[test]
fn test_shallow_last_segment_filter() {
    let registry = Registry::new();
    let seen = recording(&registry, "add:name");
    registry.add("user.name", Value::from("a")).unwrap();
    registry.add("user.other", Value::from("b")).unwrap();
    assert_eq!(seen.borrow().as_slice(), ["add:user.name"]);
}

#[test]
fn test_wildcard_filter_matches_one_level() {
    let registry = Registry::new();
    registry.add("cfg.a", Value::from(0i64)).unwrap();
    registry.add("cfg.deep.x", Value::from(0i64)).unwrap();
    let seen = recording(&registry, "set:cfg.*");
    registry.set("cfg.a", Value::from(1i64)).unwrap();
    registry.set("cfg.deep.x", Value::from(2i64)).unwrap();
    assert_eq!(seen.borrow().as_slice(), ["set:cfg.a"]);
}

#[test]
fn test_filters_use_current_separator() {
    let registry = Registry::new();
    assert!(registry.set_separator('#'));
    let seen = recording(&registry, "add:cfg#*");
    registry.add("cfg#a", Value::from(1i64)).unwrap();
    registry.add("other#a", Value::from(2i64)).unwrap();
    assert_eq!(seen.borrow().as_slice(), ["add:cfg#a"]);
}

// ── Catch-all ────────────────────────────────────────────────────────

#[test]
fn test_all_listener_sees_every_action() {
    let registry = Registry::new();
    let seen = recording(&registry, "all");
    registry.add("data", Value::from(1i64)).unwrap();
    registry.set("data", Value::from(2i64)).unwrap();
    let _ = registry.get("data");
    registry.remove("data");
    assert_eq!(
        seen.borrow().as_slice(),
        ["add:data", "set:data", "get:data", "remove:data"]
    );
}

#[test]
fn test_all_listener_with_path_filter() {
    let registry = Registry::new();
    let seen = recording(&registry, "all:data");
    registry.add("data", Value::from(1i64)).unwrap();
    registry.add("other", Value::from(2i64)).unwrap();
    registry.remove("data");
    assert_eq!(seen.borrow().as_slice(), ["add:data", "remove:data"]);
}

#[test]
fn test_unknown_action_is_rejected() {
    let registry = Registry::new();
    let result = registry.listen("explode", |_action, _path, _args| {});
    assert!(matches!(result, Err(Error::Configuration(_))));
}

// ── Re-entrancy ──────────────────────────────────────────────────────

#[test]
fn test_listener_may_reenter_the_registry() {
    let registry = Registry::new();
    registry.add("other", Value::from("present")).unwrap();
    let gets = recording(&registry, "get");
    let probe = registry.clone();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    registry
        .listen("add", move |_action, _path, _args| {
            // Reads back into the registry mid-dispatch.
            log.borrow_mut().push(probe.get("other"));
        })
        .unwrap();
    registry.add("data", Value::from(1i64)).unwrap();
    assert_eq!(seen.borrow().as_slice(), [Value::from("present")]);
    assert_eq!(gets.borrow().as_slice(), ["get:other"]);
}

#[test]
fn test_action_names() {
    assert_eq!(Action::Add.name(), "add");
    assert_eq!(Action::Set.name(), "set");
    assert_eq!(Action::Get.name(), "get");
    assert_eq!(Action::Remove.name(), "remove");
    assert_eq!(Action::ListOps.name(), "listops");
}
