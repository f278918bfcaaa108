use chart_core::{LabPanel, Scope};
use chart_history::build_component_history;
use serde_json::json;

fn panel(value: serde_json::Value) -> LabPanel {
    serde_json::from_value(value).expect("lab panel fixture")
}

#[test]
fn observations_keep_their_source_scope() {
    let encounter = vec![panel(json!({
        "date": "2024-03-05T14:07:00",
        "components": [{ "name": "WBC", "value": 12.1, "high": 10.5, "low": 4.0 }]
    }))];
    let chart = vec![panel(json!({
        "date": "2023-11-20T09:15:00",
        "components": [{ "name": "HGB", "value": 13.4 }]
    }))];

    let history = build_component_history(&encounter, &chart);

    let wbc = &history["WBC"];
    assert_eq!(wbc.scoped(Scope::Encounter).len(), 1);
    assert!(wbc.scoped(Scope::Chart).is_empty());
    assert_eq!(wbc.encounter[0].scope, Scope::Encounter);

    let hgb = &history["HGB"];
    assert!(hgb.encounter.is_empty());
    assert_eq!(hgb.chart.len(), 1);
    assert_eq!(hgb.chart[0].scope, Scope::Chart);
}

#[test]
fn scope_arrays_sort_newest_first() {
    let encounter = vec![
        panel(json!({
            "date": "2024-03-04T08:00:00",
            "components": [{ "name": "Na", "value": 138 }]
        })),
        panel(json!({
            "date": "2024-03-06T08:00:00",
            "components": [{ "name": "Na", "value": 140 }]
        })),
        panel(json!({
            "date": "2024-03-05T08:00:00",
            "components": [{ "name": "Na", "value": 139 }]
        })),
    ];

    let history = build_component_history(&encounter, &[]);
    let values: Vec<_> = history["Na"]
        .encounter
        .iter()
        .map(|obs| obs.value.clone())
        .collect();

    assert_eq!(values, vec![json!(140), json!(139), json!(138)]);
}

#[test]
fn unparseable_dates_sort_last() {
    let encounter = vec![
        panel(json!({
            "date": "not a date",
            "components": [{ "name": "K", "value": 4.1 }]
        })),
        panel(json!({
            "date": "2024-03-06T08:00:00",
            "components": [{ "name": "K", "value": 4.4 }]
        })),
    ];

    let history = build_component_history(&encounter, &[]);
    let potassium = &history["K"];

    assert_eq!(potassium.encounter.len(), 2);
    assert!(potassium.encounter[0].recorded_at.is_some());
    assert!(potassium.encounter[1].recorded_at.is_none());
}

#[test]
fn component_name_is_case_sensitive() {
    let encounter = vec![panel(json!({
        "date": "2024-03-05T14:07:00",
        "components": [
            { "name": "WBC", "value": 12.1 },
            { "name": "wbc", "value": 11.0 }
        ]
    }))];

    let history = build_component_history(&encounter, &[]);

    assert!(history.contains_key("WBC"));
    assert!(history.contains_key("wbc"));
    assert_eq!(history["WBC"].encounter.len(), 1);
    assert_eq!(history["wbc"].encounter.len(), 1);
}

#[test]
fn empty_inputs_produce_empty_history() {
    let history = build_component_history(&[], &[]);
    assert!(history.is_empty());
}

#[test]
fn aggregation_is_idempotent() {
    let encounter = vec![panel(json!({
        "date": "2024-03-05T14:07:00",
        "components": [{ "name": "WBC", "value": 12.1 }, { "name": "HGB", "value": 13.4 }]
    }))];
    let chart = vec![panel(json!({
        "date": "2023-11-20T09:15:00",
        "components": [{ "name": "WBC", "value": 7.4 }]
    }))];

    let first = build_component_history(&encounter, &chart);
    let second = build_component_history(&encounter, &chart);

    assert_eq!(first, second);
}
