//! Bridge WASM <-> JavaScript trung lập framework.
//!
//! Việc lọc hiển thị (conditional + order) vẫn nằm ở phía JavaScript;
//! các hàm ở đây nhận tài liệu đã lọc sẵn.

use chart_core::{
    ChartError, FlowsheetDefinition, FlowsheetEntry, LabPanel, SepsisThresholds, ShowAll,
};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsThresholds {
    #[serde(default)]
    respiratory_rate: Option<f64>,
    #[serde(default)]
    heart_rate: Option<f64>,
    #[serde(default)]
    temperature: Option<f64>,
}

impl From<JsThresholds> for SepsisThresholds {
    fn from(cfg: JsThresholds) -> Self {
        let mut base = SepsisThresholds::default();
        if let Some(rate) = cfg.respiratory_rate {
            base.respiratory_rate = rate;
        }
        if let Some(rate) = cfg.heart_rate {
            base.heart_rate = rate;
        }
        if let Some(degrees) = cfg.temperature {
            base.temperature = degrees;
        }
        base
    }
}

#[wasm_bindgen]
pub fn summarize_chart(chart: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let chart_value = from_value::<serde_json::Value>(chart)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được JSON hồ sơ: {err}")))?;

    let histories = chart_history::summarize_chart_value(&chart_value)
        .map_err(|err| JsValue::from_str(&format_chart_error(err)))?;

    to_value(&histories)
        .map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

#[wasm_bindgen]
pub fn build_component_history(
    encounter_labs: JsValue,
    chart_labs: JsValue,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let encounter: Vec<LabPanel> = section(encounter_labs, "danh sách xét nghiệm lần khám")?;
    let chart: Vec<LabPanel> = section(chart_labs, "danh sách xét nghiệm hồ sơ")?;

    let history = chart_history::build_component_history(&encounter, &chart);

    to_value(&history)
        .map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

#[wasm_bindgen]
pub fn build_flowsheet_history(
    encounter_flowsheets: JsValue,
    chart_flowsheets: JsValue,
    flowsheet_defs: JsValue,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let encounter: Vec<FlowsheetEntry> = section(encounter_flowsheets, "flowsheet lần khám")?;
    let chart: Vec<FlowsheetEntry> = section(chart_flowsheets, "flowsheet hồ sơ")?;
    let defs: Vec<FlowsheetDefinition> = section(flowsheet_defs, "định nghĩa flowsheet")?;

    let history = chart_history::build_flowsheet_history(&encounter, &chart, &defs);

    to_value(&history)
        .map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

#[wasm_bindgen]
pub fn evaluate_sepsis_alert(
    filtered_flowsheets: JsValue,
    filtered_labs: JsValue,
    thresholds: Option<JsValue>,
) -> Result<bool, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let flowsheets: Vec<FlowsheetEntry> = section(filtered_flowsheets, "flowsheet sinh hiệu")?;
    let labs: Vec<LabPanel> = section(filtered_labs, "danh sách xét nghiệm")?;

    let thresholds = match thresholds {
        Some(js_thresholds) => {
            let cfg: JsThresholds = from_value(js_thresholds)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được ngưỡng: {err}")))?;
            SepsisThresholds::from(cfg)
        }
        None => SepsisThresholds::default(),
    };

    Ok(chart_history::evaluate_sepsis_alert(
        &flowsheets,
        &labs,
        &[],
        &[],
        &ShowAll,
        &thresholds,
    ))
}

#[wasm_bindgen]
pub fn format_observation_date(value: &str) -> String {
    chart_history::format_observation_date(value)
}

fn section<T: serde::de::DeserializeOwned>(value: JsValue, label: &str) -> Result<Vec<T>, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(Vec::new());
    }

    from_value(value).map_err(|err| JsValue::from_str(&format!("Không đọc được {label}: {err}")))
}

fn format_chart_error(err: ChartError) -> String {
    format!("Chart error: {err}")
}
