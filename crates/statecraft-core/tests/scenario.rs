//! End-to-end store behaviour through the public API

use statecraft_core::predicate::{gt, lt};
use statecraft_core::rng::{random_int, seed};
use statecraft_core::{
    entity_id, remove_key, roll_dice, set, try_update, update, DiffEntry, ErrorCode, FieldMatch,
    Filter, GameStore, Value,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

type Seen = Arc<Mutex<Vec<(String, Option<Value>, Option<Value>)>>>;

/// Store logs show up with `RUST_LOG=statecraft_core=trace cargo test`
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn party_state() -> Value {
    Value::map([
        (
            "party",
            Value::list([
                Value::map([("id", Value::from("alice")), ("hp", Value::from(20))]),
                Value::map([("id", Value::from("bob")), ("hp", Value::from(15))]),
            ]),
        ),
        ("turn", Value::from(1)),
    ])
}

fn watch(store: &mut GameStore, pattern: &str) -> Seen {
    let seen: Seen = Arc::default();
    let sink = Arc::clone(&seen);
    store.observe(pattern, move |to, from, event| {
        sink.lock()
            .unwrap()
            .push((event.path.to_string(), to.cloned(), from.cloned()));
    });
    seen
}

#[test]
fn turn_then_damage() {
    init_tracing();
    let mut store = GameStore::new(party_state());
    let turns = watch(&mut store, "turn");
    let hps = watch(&mut store, "party.*.hp");

    let result = store.dispatch(vec![set("turn", 2)]);
    assert!(result.valid);
    assert_eq!(
        result.diff.entries,
        vec![DiffEntry::new("turn", Some(Value::Int(1)), Some(Value::Int(2)))]
    );
    assert_eq!(
        *turns.lock().unwrap(),
        vec![("turn".to_string(), Some(Value::Int(2)), Some(Value::Int(1)))]
    );
    assert!(hps.lock().unwrap().is_empty());

    let result = store.dispatch(vec![update("party.0.hp", |hp| {
        Value::from(hp.as_int().unwrap_or(0) - 5)
    })]);
    assert!(result.valid);
    assert_eq!(
        result.diff.entries,
        vec![DiffEntry::new(
            "party.0.hp",
            Some(Value::Int(20)),
            Some(Value::Int(15))
        )]
    );
    assert_eq!(
        *hps.lock().unwrap(),
        vec![(
            "party.0.hp".to_string(),
            Some(Value::Int(15)),
            Some(Value::Int(20))
        )]
    );
    assert_eq!(turns.lock().unwrap().len(), 1);
    assert_eq!(store.history().len(), 2);
}

#[test]
fn duplicate_registrations_each_fire_once() {
    let mut store = GameStore::new(party_state());
    let first = watch(&mut store, "party.*.hp");
    let second = watch(&mut store, "party.*.hp");

    store.dispatch(vec![set("party.1.hp", 1)]);

    assert_eq!(first.lock().unwrap().len(), 1);
    assert_eq!(second.lock().unwrap().len(), 1);
}

#[test]
fn invalid_dispatch_reports_structured_error() {
    init_tracing();
    let mut store = GameStore::new(party_state());
    let result = store.dispatch(vec![set("party.7", Value::Null)]);

    assert!(!result.valid);
    let error = result.error.expect("error");
    assert_eq!(error.code, ErrorCode::IndexOutOfRange);
    assert_eq!(error.context.action, "set party.7");
    assert!(error.context.suggestion.is_some());
    assert_eq!(store.get("turn"), Some(&Value::Int(1)));
}

#[test]
fn rejected_roll_aborts_whole_dispatch() {
    init_tracing();
    let mut store = GameStore::new(party_state());
    let seen = watch(&mut store, "turn");
    let before = store.get_state();

    let result = store.dispatch(vec![
        set("turn", 2),
        try_update("party.1.hp", |hp| {
            let (damage, _) = roll_dice(seed(3), "2x6")?;
            Ok(Value::from(hp.as_int().unwrap_or(0) - damage))
        }),
    ]);

    assert!(!result.valid);
    let error = result.error.expect("error");
    assert_eq!(error.code, ErrorCode::InvalidDiceNotation);
    assert_eq!(error.context.action, "update party.1.hp");
    assert!(Arc::ptr_eq(&store.get_state(), &before));
    assert!(seen.lock().unwrap().is_empty());
    assert!(store.history().is_empty());
}

#[test]
fn queries_over_store() {
    let store = GameStore::new(party_state());

    let wounded = Filter::fields([("hp", FieldMatch::from(lt(16.0)))]);
    let found = store.query("party", Some(&wounded));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get_key("id"), Some(&Value::from("bob")));

    assert_eq!(store.query("party.*.id", None).len(), 2);
    assert!(store.has("turn", Some(&gt(0.0))));
    assert!(store.get("party.2").is_none());
}

#[test]
fn stunned_removal_updates_index() {
    init_tracing();
    let mut store = GameStore::new(Value::map([(
        "entities",
        Value::map([
            ("e1", Value::map([("stunned", true), ("poisoned", true)])),
            ("e2", Value::map([("stunned", true)])),
            ("e3", Value::map([("poisoned", true)])),
        ]),
    )]));
    store.enable_component_index("entities");

    store.dispatch(vec![remove_key("entities.e1", "stunned")]);

    assert_eq!(
        *store.entities_with_component("stunned"),
        BTreeSet::from([entity_id("e2")])
    );
    assert_eq!(
        *store.entities_with_component("poisoned"),
        BTreeSet::from([entity_id("e1"), entity_id("e3")])
    );
}

#[test]
fn seeded_rolls_are_reproducible() {
    let run = || {
        let mut state = seed(42);
        let mut out = Vec::new();
        for _ in 0..5 {
            let (v, next) = random_int(state, 1, 6).expect("range");
            out.push(v);
            state = next;
        }
        out
    };
    assert_eq!(run(), run());

    let (total, next) = roll_dice(seed(1), "2d6+3").expect("roll");
    assert!((5..=15).contains(&total));
    assert_eq!(roll_dice(seed(1), "2d6+3").expect("roll"), (total, next));
}
