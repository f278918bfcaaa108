use std::path::PathBuf;

use anyhow::Context;
use chart_core::{
    ChartSnapshot, FlowsheetEntry, SepsisThresholds, ShowAll, VITALS_FLOWSHEET_ID,
};
use chart_history::{evaluate_sepsis_alert, summarize_chart};
use clap::Parser;
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(
    name = "chart-cli",
    about = "Tổng hợp lịch sử chỉ số từ file JSON hồ sơ bệnh án."
)]
struct Args {
    /// Đường dẫn tới file JSON hồ sơ.
    #[arg(short, long)]
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;

    let snapshot: ChartSnapshot = serde_json::from_str(&data)
        .with_context(|| format!("Không đọc được hồ sơ {:?}", args.input))?;

    let histories = summarize_chart(&snapshot);

    let vitals: Vec<FlowsheetEntry> = snapshot
        .encounter_flowsheets
        .iter()
        .filter(|entry| {
            entry.flowsheet.as_ref().and_then(Value::as_str) == Some(VITALS_FLOWSHEET_ID)
        })
        .cloned()
        .collect();

    let alert = evaluate_sepsis_alert(
        &vitals,
        &snapshot.encounter_labs,
        &snapshot.conditionals,
        &snapshot.orders,
        &ShowAll,
        &SepsisThresholds::default(),
    );

    println!(
        "Component metrics: {}\nFlowsheet metrics: {}\nPossible sepsis: {}",
        histories.components.len(),
        histories.flowsheets.len(),
        if alert { "yes" } else { "no" }
    );

    Ok(())
}
