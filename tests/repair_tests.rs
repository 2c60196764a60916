use std::sync::Arc;

use exploration_model::loading::repair::accepts_action;
use exploration_model::loading::{IdRemap, LoadError, RepairEngine};
use exploration_model::state::{Capabilities, ConcreteId, Widget};
use exploration_model::trace::ActionType;

use crate::common::fixtures::{button, checkbox, input, label, moved, state_of, widget};

mod common;

fn engine() -> (RepairEngine, Arc<IdRemap>) {
    let remap = Arc::new(IdRemap::default());
    (RepairEngine::new(Arc::clone(&remap)), remap)
}

/// A reference to `widget` as it was recorded before its layout changed.
fn stale_reference(widget: &Widget) -> ConcreteId {
    moved(widget, 500).id
}

// =========================================================================
// Capability table
// =========================================================================

#[test]
fn capability_table() {
    let click = ActionType::Click;
    let long_click = ActionType::LongClick;
    let tick = ActionType::Tick;
    let text = ActionType::TextInsert;

    assert!(accepts_action(&button("OK", 0), &click));
    assert!(!accepts_action(&button("OK", 0), &long_click));
    assert!(!accepts_action(&button("OK", 0), &text));

    assert!(accepts_action(&checkbox("Remember", 0), &tick));
    assert!(accepts_action(&checkbox("Remember", 0), &click), "Checkable counts as clickable");
    assert!(!accepts_action(&button("OK", 0), &tick));

    assert!(accepts_action(&input("Name", 0), &text));

    let long_only = widget(
        "android.view.View",
        "Hold",
        0,
        Capabilities {
            long_clickable: true,
            enabled: true,
            ..Capabilities::default()
        },
    );
    assert!(accepts_action(&long_only, &long_click));
    assert!(accepts_action(&long_only, &ActionType::ClickEvent), "Click may fall back to long click");

    assert!(!accepts_action(&label("Title", 0), &click));
    assert!(!accepts_action(&button("OK", 0), &ActionType::Swipe), "Other types never match");
}

#[test]
fn disabled_widgets_accept_nothing() {
    let disabled = widget(
        "android.widget.Button",
        "OK",
        0,
        Capabilities {
            clickable: true,
            enabled: false,
            ..Capabilities::default()
        },
    );
    assert!(!accepts_action(&disabled, &ActionType::Click));
}

// =========================================================================
// Repair tiers
// =========================================================================

#[test]
fn exact_match_needs_no_mapping() {
    let ok = button("OK", 0);
    let state = state_of(&[label("Title", 0), ok.clone()]);
    let (engine, remap) = engine();

    let repaired = engine.repair(ok.id, &ActionType::Click, &state).unwrap();

    assert_eq!(repaired, ok.id);
    assert!(remap.is_empty(), "Identity mappings are not recorded");
}

#[test]
fn uid_match_with_capability_is_adopted_and_cached() {
    let ok = button("OK", 0);
    let recorded = stale_reference(&ok);
    let state = state_of(&[label("Title", 0), ok.clone()]);
    let (engine, remap) = engine();

    let repaired = engine.repair(recorded, &ActionType::Click, &state).unwrap();

    assert_eq!(repaired, ok.id);
    assert_eq!(remap.get(&recorded), Some(ok.id));
    assert_eq!(engine.fixed_widget_id(recorded), ok.id);
}

#[test]
fn repair_is_idempotent() {
    let ok = button("OK", 0);
    let recorded = stale_reference(&ok);
    let state = state_of(&[ok.clone()]);
    let (engine, remap) = engine();

    let first = engine.repair(recorded, &ActionType::Click, &state).unwrap();
    let second = engine.repair(recorded, &ActionType::Click, &state).unwrap();

    assert_eq!(first, second);
    assert_eq!(remap.len(), 1);
}

#[test]
fn cached_mapping_wins_when_present_in_source() {
    let ok = button("OK", 0);
    let recorded = stale_reference(&ok);
    let other_ok = moved(&ok, 100);
    let state = state_of(&[other_ok.clone(), ok.clone()]);
    let (engine, remap) = engine();
    remap.insert(recorded, ok.id);

    // without the mapping the first uid match (other_ok) would be chosen
    let repaired = engine.repair(recorded, &ActionType::Click, &state).unwrap();

    assert_eq!(repaired, ok.id);
}

#[test]
fn capability_filter_prefers_compatible_widget() {
    let field = input("Search", 0);
    let recorded = stale_reference(&field);

    // same uid, listed first, but disabled
    let mut disabled = moved(&field, 60);
    disabled.capabilities.enabled = false;
    let disabled = disabled.with_computed_id();
    let state = state_of(&[disabled, field.clone()]);
    let (engine, _) = engine();

    let repaired = engine.repair(recorded, &ActionType::TextInsert, &state).unwrap();

    assert_eq!(repaired, field.id);
}

#[test]
fn several_candidates_choose_first_in_widget_order() {
    let ok = button("OK", 0);
    let recorded = stale_reference(&ok);
    let first = moved(&ok, 100);
    let second = moved(&ok, 200);
    let state = state_of(&[first.clone(), second.clone()]);
    let (engine, remap) = engine();

    let repaired = engine.repair(recorded, &ActionType::Click, &state).unwrap();

    assert_eq!(repaired, first.id);
    assert_eq!(remap.get(&recorded), Some(first.id));
}

#[test]
fn degraded_uid_match_ignores_capability() {
    let ok = button("OK", 0);
    let recorded = stale_reference(&ok);
    let state = state_of(&[ok.clone()]);
    let (engine, _) = engine();

    // a button cannot take text, but it is the only element with that uid
    let repaired = engine.repair(recorded, &ActionType::TextInsert, &state).unwrap();

    assert_eq!(repaired, ok.id);
}

#[test]
fn no_uid_match_is_exhausted() {
    let submit = button("Submit", 0);
    let recorded = button("Sumbit", 0).id;
    let state = state_of(&[submit, label("Form", 50)]);
    let (engine, remap) = engine();

    let err = engine
        .repair(recorded, &ActionType::TextInsert, &state)
        .unwrap_err();

    match err {
        LoadError::RepairExhausted { widget: missing, state: in_state } => {
            assert_eq!(missing, recorded);
            assert_eq!(in_state, state.id);
        }
        other => panic!("Expected RepairExhausted, got {:?}", other),
    }
    assert!(remap.is_empty());
}

// =========================================================================
// Remap table
// =========================================================================

#[test]
fn remap_keeps_first_mapping() {
    let remap = IdRemap::default();
    let from = button("A", 0).id;
    let first = button("B", 0).id;
    let second = button("C", 0).id;

    assert_eq!(remap.insert(from, first), first);
    assert_eq!(remap.insert(from, second), first, "First mapping stays in effect");
    assert_eq!(remap.snapshot().get(&from), Some(&first));
}
