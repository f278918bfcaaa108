//! Kiểu dữ liệu lõi cho tổng hợp lịch sử chỉ số lâm sàng và quy tắc cảnh báo.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Định danh cố định của flowsheet sinh hiệu trong hồ sơ xuất ra.
pub const VITALS_FLOWSHEET_ID: &str = "vitals";

/// Ngưỡng sinh hiệu cho quy tắc cảnh báo nhiễm trùng huyết.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SepsisThresholds {
    /// Nhịp thở (lần/phút), cảnh báo khi vượt quá.
    pub respiratory_rate: f64,
    /// Nhịp tim (lần/phút), cảnh báo khi vượt quá.
    pub heart_rate: f64,
    /// Thân nhiệt (độ C), cảnh báo khi vượt quá.
    pub temperature: f64,
}

impl Default for SepsisThresholds {
    fn default() -> Self {
        Self {
            respiratory_rate: 22.0,
            heart_rate: 100.0,
            temperature: 38.0,
        }
    }
}

/// Nguồn gốc của một quan sát: lần khám hiện tại hay toàn bộ hồ sơ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Encounter,
    Chart,
}

/// Một giá trị lâm sàng có dấu thời gian.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub name: String,
    pub value: Value,
    pub recorded_at: Option<DateTime<Utc>>,
    pub scope: Scope,
}

/// Lịch sử một chỉ số, tách theo phạm vi.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricHistory {
    pub encounter: Vec<Observation>,
    pub chart: Vec<Observation>,
}

impl MetricHistory {
    /// Danh sách quan sát của một phạm vi.
    pub fn scoped(&self, scope: Scope) -> &[Observation] {
        match scope {
            Scope::Encounter => &self.encounter,
            Scope::Chart => &self.chart,
        }
    }

    pub fn scoped_mut(&mut self, scope: Scope) -> &mut Vec<Observation> {
        match scope {
            Scope::Encounter => &mut self.encounter,
            Scope::Chart => &mut self.chart,
        }
    }
}

/// Nhãn chỉ số → lịch sử theo phạm vi.
pub type HistoryMap = BTreeMap<String, MetricHistory>;

/// Một phiếu kết quả xét nghiệm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LabPanel {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub components: Vec<LabComponent>,
}

/// Một thành phần trong phiếu xét nghiệm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabComponent {
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub high: Option<Value>,
    #[serde(default)]
    pub low: Option<Value>,
}

/// Một lần ghi flowsheet; mọi trường ngoài `id`/`date`/`flowsheet` là chỉ số.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FlowsheetEntry {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub flowsheet: Option<Value>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Định nghĩa flowsheet, chỉ dùng để tra nhãn hiển thị.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowsheetDefinition {
    pub id: Value,
    #[serde(default)]
    pub rows: Vec<RowDefinition>,
}

/// Một hàng trong định nghĩa flowsheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowDefinition {
    pub name: String,
    pub label: String,
}

/// Hồ sơ bệnh án do ứng dụng chủ xuất ra; phần thiếu coi như rỗng.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartSnapshot {
    pub encounter_labs: Vec<LabPanel>,
    pub chart_labs: Vec<LabPanel>,
    pub encounter_flowsheets: Vec<FlowsheetEntry>,
    pub chart_flowsheets: Vec<FlowsheetEntry>,
    pub flowsheet_defs: Vec<FlowsheetDefinition>,
    pub conditionals: Vec<Value>,
    pub orders: Vec<Value>,
}

/// Kết quả tổng hợp cuối cùng.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartHistories {
    pub components: HistoryMap,
    pub flowsheets: HistoryMap,
}

/// Hợp đồng lọc hiển thị tài liệu (conditional + order) do ứng dụng chủ cung cấp.
pub trait DocumentFilter {
    fn filter_flowsheets(
        &self,
        entries: &[FlowsheetEntry],
        conditionals: &[Value],
        orders: &[Value],
    ) -> Vec<FlowsheetEntry>;

    fn filter_labs(
        &self,
        panels: &[LabPanel],
        conditionals: &[Value],
        orders: &[Value],
    ) -> Vec<LabPanel>;
}

/// Bộ lọc cho qua toàn bộ tài liệu (dùng cho mock/testing).
pub struct ShowAll;

impl DocumentFilter for ShowAll {
    fn filter_flowsheets(
        &self,
        entries: &[FlowsheetEntry],
        _conditionals: &[Value],
        _orders: &[Value],
    ) -> Vec<FlowsheetEntry> {
        entries.to_vec()
    }

    fn filter_labs(
        &self,
        panels: &[LabPanel],
        _conditionals: &[Value],
        _orders: &[Value],
    ) -> Vec<LabPanel> {
        panels.to_vec()
    }
}

/// Lỗi chung khi đọc dữ liệu hồ sơ.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu")]
    MissingData,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
}

/// Tiện ích dựng kết quả rỗng (dùng cho mock/testing).
pub fn empty_histories() -> ChartHistories {
    ChartHistories::default()
}
