//! Normalizing raw solution payloads into canonical actions.

use seedcheck_core::{
    normalize_action, normalize_actions, try_normalize_action, Action, ActionKind, DropReason,
    SelectorKind,
};
use serde_json::json;

#[test]
fn legacy_input_value_maps_to_type_text() {
    let action = normalize_action(&json!({"type": "input", "value": "hello"})).expect("kept");
    assert_eq!(action.kind(), ActionKind::Type);
    assert_eq!(
        serde_json::to_value(&action).expect("serialize"),
        json!({"type": "TypeAction", "text": "hello"})
    );
}

#[test]
fn click_without_target_is_dropped() {
    assert_eq!(
        try_normalize_action(&json!({"type": "ClickAction"})),
        Err(DropReason::NoClickTarget)
    );
    assert_eq!(
        try_normalize_action(&json!({"type": "click", "x": 10})),
        Err(DropReason::NoClickTarget)
    );
    assert!(normalize_action(&json!({"type": "click", "x": 10, "y": 20})).is_some());
}

#[test]
fn type_without_text_is_dropped() {
    for raw in [
        json!({"type": "TypeAction", "text": "   "}),
        json!({"type": "TypeAction"}),
        json!({"type": "type_action", "value": ""}),
    ] {
        assert_eq!(
            try_normalize_action(&raw),
            Err(DropReason::BlankText("type")),
            "{raw}"
        );
    }
}

#[test]
fn drops_do_not_affect_siblings() {
    let batch = vec![
        json!({"type": "navigate", "url": "http://app/?seed=1"}),
        json!("not an action"),
        json!({"type": "click"}),
        json!({"type": "wait"}),
        json!({"type": "select", "text": "Large",
               "selector": {"value": "//select[@id='size']"}}),
    ];
    let actions = normalize_actions(&batch);
    let kinds: Vec<ActionKind> = actions.iter().map(Action::kind).collect();
    assert_eq!(
        kinds,
        vec![ActionKind::Navigate, ActionKind::Wait, ActionKind::SelectOption]
    );
    assert_eq!(
        actions[2].selector().map(|s| s.kind),
        Some(SelectorKind::Xpath)
    );
}

#[test]
fn wait_defaults_to_one_second() {
    let action = normalize_action(&json!({"type": "WaitAction"})).expect("kept");
    assert_eq!(
        action,
        Action::Wait {
            selector: None,
            time_seconds: Some(1.0)
        }
    );
    let action =
        normalize_action(&json!({"type": "wait", "timeout_seconds": "2.5"})).expect("kept");
    assert_eq!(
        action,
        Action::Wait {
            selector: None,
            time_seconds: Some(2.5)
        }
    );
}

#[test]
fn nested_attributes_are_flattened() {
    let action = normalize_action(&json!({
        "type": "NavigateAction",
        "attributes": {"url": "http://app/list?seed=3"}
    }))
    .expect("kept");
    assert_eq!(action.navigate_url(), Some("http://app/list?seed=3"));
}

#[test]
fn unknown_types_survive_with_a_guessed_tag() {
    let action = normalize_action(&json!({"type": "hover_element", "duration": 2})).expect("kept");
    assert_eq!(action.kind(), ActionKind::Other);
    assert_eq!(action.tag(), "HoverElementAction");
    assert_eq!(
        serde_json::to_value(&action).expect("serialize"),
        json!({"type": "HoverElementAction", "duration": 2})
    );
}

#[test]
fn malformed_selector_drops_interactive_actions_only() {
    assert_eq!(
        try_normalize_action(&json!({"type": "click", "selector": "#buy"})),
        Err(DropReason::MalformedSelector)
    );
    let wait = normalize_action(&json!({"type": "wait", "selector": "#spinner", "time_seconds": 3}))
        .expect("kept");
    assert!(wait.selector().is_none());
}
