//! Chart-document history aggregation and sepsis-rule evaluation.

use chart_core::{
    ChartError, ChartHistories, ChartSnapshot, DocumentFilter, FlowsheetDefinition, FlowsheetEntry,
    HistoryMap, LabComponent, LabPanel, Observation, Scope, SepsisThresholds,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

const WBC_COMPONENT: &str = "WBC";
const RESPIRATORY_RATE_FIELD: &str = "rr";
const HEART_RATE_FIELD: &str = "hr";
const TEMPERATURE_FIELD: &str = "temp";

/// Aggregate both histories from a chart document in JSON text form.
pub fn summarize_chart_str(chart_json: &str) -> Result<ChartHistories, ChartError> {
    let value: Value =
        serde_json::from_str(chart_json).map_err(|err| ChartError::Parse(err.to_string()))?;
    summarize_chart_value(&value)
}

/// Aggregate both histories from a chart document as a `serde_json::Value`.
pub fn summarize_chart_value(chart: &Value) -> Result<ChartHistories, ChartError> {
    if !chart.is_object() {
        return Err(ChartError::MissingData);
    }

    let snapshot: ChartSnapshot =
        serde_json::from_value(chart.clone()).map_err(|err| ChartError::Parse(err.to_string()))?;

    Ok(summarize_chart(&snapshot))
}

/// Aggregate both histories from an already-deserialized chart snapshot.
pub fn summarize_chart(snapshot: &ChartSnapshot) -> ChartHistories {
    ChartHistories {
        components: build_component_history(&snapshot.encounter_labs, &snapshot.chart_labs),
        flowsheets: build_flowsheet_history(
            &snapshot.encounter_flowsheets,
            &snapshot.chart_flowsheets,
            &snapshot.flowsheet_defs,
        ),
    }
}

/// Fold lab panels from both scopes into a per-component history.
///
/// The component name is the exact, case-sensitive join key; no
/// normalization is applied.
pub fn build_component_history(
    encounter_labs: &[LabPanel],
    chart_labs: &[LabPanel],
) -> HistoryMap {
    let mut history = HistoryMap::new();
    record_lab_scope(&mut history, encounter_labs, Scope::Encounter);
    record_lab_scope(&mut history, chart_labs, Scope::Chart);
    sort_history(&mut history);
    history
}

/// Fold flowsheet entries from both scopes into a per-metric history,
/// keyed by the display label resolved from the flowsheet definitions.
///
/// Distinct raw field keys that resolve to the same label merge into one
/// history entry; a missing definition or row degrades to the raw key.
pub fn build_flowsheet_history(
    encounter_flowsheets: &[FlowsheetEntry],
    chart_flowsheets: &[FlowsheetEntry],
    flowsheet_defs: &[FlowsheetDefinition],
) -> HistoryMap {
    let mut history = HistoryMap::new();
    record_flowsheet_scope(
        &mut history,
        encounter_flowsheets,
        flowsheet_defs,
        Scope::Encounter,
    );
    record_flowsheet_scope(
        &mut history,
        chart_flowsheets,
        flowsheet_defs,
        Scope::Chart,
    );
    sort_history(&mut history);
    history
}

fn record_lab_scope(history: &mut HistoryMap, panels: &[LabPanel], scope: Scope) {
    for panel in panels {
        let recorded_at = panel.date.as_deref().and_then(parse_instant);
        for component in &panel.components {
            history
                .entry(component.name.clone())
                .or_default()
                .scoped_mut(scope)
                .push(Observation {
                    name: component.name.clone(),
                    value: component.value.clone(),
                    recorded_at,
                    scope,
                });
        }
    }
}

fn record_flowsheet_scope(
    history: &mut HistoryMap,
    entries: &[FlowsheetEntry],
    flowsheet_defs: &[FlowsheetDefinition],
    scope: Scope,
) {
    for entry in entries {
        let recorded_at = entry.date.as_deref().and_then(parse_instant);
        for (field, value) in &entry.fields {
            let label = resolve_label(flowsheet_defs, entry.flowsheet.as_ref(), field);
            history
                .entry(label)
                .or_default()
                .scoped_mut(scope)
                .push(Observation {
                    name: field.clone(),
                    value: value.clone(),
                    recorded_at,
                    scope,
                });
        }
    }
}

fn resolve_label(
    flowsheet_defs: &[FlowsheetDefinition],
    sheet_id: Option<&Value>,
    field: &str,
) -> String {
    let Some(sheet_id) = sheet_id else {
        return field.to_string();
    };

    flowsheet_defs
        .iter()
        .find(|def| &def.id == sheet_id)
        .and_then(|def| def.rows.iter().find(|row| row.name == field))
        .map(|row| row.label.clone())
        .unwrap_or_else(|| field.to_string())
}

fn sort_history(history: &mut HistoryMap) {
    for metric in history.values_mut() {
        // Newest first; observations without a parseable timestamp sort
        // last, and the stable sort keeps insertion order on ties.
        metric
            .encounter
            .sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        metric
            .chart
            .sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    }
}

/// Evaluate the possible-sepsis rule over visibility-filtered documents.
///
/// `flowsheets` is expected to hold entries from the vital-signs
/// flowsheet only; the caller pre-selects by definition id. The rule
/// holds when the newest filtered vitals entry breaches every threshold
/// strictly and at least one `WBC` component in the filtered labs sits
/// strictly above its high bound. The WBC check is not bounded by time,
/// only by existence. Missing fields and empty inputs evaluate to
/// `false` rather than failing.
pub fn evaluate_sepsis_alert(
    flowsheets: &[FlowsheetEntry],
    labs: &[LabPanel],
    conditionals: &[Value],
    orders: &[Value],
    filter_documents: &dyn DocumentFilter,
    thresholds: &SepsisThresholds,
) -> bool {
    let mut vitals = filter_documents.filter_flowsheets(flowsheets, conditionals, orders);
    let labs = filter_documents.filter_labs(labs, conditionals, orders);

    vitals.sort_by(|a, b| {
        let a_at = a.date.as_deref().and_then(parse_instant);
        let b_at = b.date.as_deref().and_then(parse_instant);
        b_at.cmp(&a_at)
    });

    let Some(latest) = vitals.first() else {
        return false;
    };

    let vitals_breach = exceeds(latest, RESPIRATORY_RATE_FIELD, thresholds.respiratory_rate)
        && exceeds(latest, HEART_RATE_FIELD, thresholds.heart_rate)
        && exceeds(latest, TEMPERATURE_FIELD, thresholds.temperature);

    if !vitals_breach {
        return false;
    }

    labs.iter()
        .flat_map(|panel| panel.components.iter())
        .filter(|component| component.name == WBC_COMPONENT)
        .any(component_flagged_high)
}

/// Format a raw observation timestamp as `MM/DD/YY HHmm`.
///
/// Offsets are normalized to UTC first; an unparseable input formats as
/// the empty string.
pub fn format_observation_date(value: &str) -> String {
    match parse_instant(value) {
        Some(instant) => instant.format("%m/%d/%y %H%M").to_string(),
        None => String::new(),
    }
}

fn exceeds(entry: &FlowsheetEntry, field: &str, threshold: f64) -> bool {
    match entry.fields.get(field).and_then(numeric_value) {
        Some(value) => value > threshold,
        None => false,
    }
}

fn component_flagged_high(component: &LabComponent) -> bool {
    let (Some(value), Some(high)) = (
        numeric_value(&component.value),
        component.high.as_ref().and_then(numeric_value),
    ) else {
        return false;
    };

    value > high
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}
