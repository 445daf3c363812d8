// src/pipeline/export.rs

//! Offer export and market reports.

use std::path::Path;

use serde_json::Value;

use crate::error::Result;
use crate::models::{ExportFormat, ExportResult, FilterCriteria};
use crate::services::MarketData;
use crate::utils::{log, settle};

/// Export offers, writing the payload to `output` when given.
pub async fn run_export(
    market: &MarketData,
    format: ExportFormat,
    filters: FilterCriteria,
    output: Option<&Path>,
) -> Result<ExportResult> {
    log::header("Export Offers");

    let export = market.export(format, filters).await?;
    log::success(&format!(
        "Exported {} record(s) as {}",
        export.total_records, export.format
    ));

    if let Some(path) = output {
        tokio::fs::write(path, render_payload(&export.data)?).await?;
        log::sub_item(&format!("Written to {}", path.display()));
    } else if let Some(filename) = &export.filename {
        log::sub_item(&format!("Suggested file name: {filename}"));
    }
    Ok(export)
}

/// CSV payloads arrive as a JSON string; anything else is pretty-printed.
fn render_payload(data: &Value) -> Result<String> {
    match data {
        Value::String(text) => Ok(text.clone()),
        other => Ok(serde_json::to_string_pretty(other)?),
    }
}

/// Print the market summary report for `period` (e.g. `30d`).
pub async fn run_report(market: &MarketData, period: &str) -> Result<()> {
    log::header(&format!("Market Report ({period})"));

    let report = settle("Market report", market.market_report(period).await)?;
    let summary = &report.summary;
    log::summary(
        &format!("{} generated {}", report.report_period, report.generated_at),
        &[
            ("Offers", summary.total_offers.to_string()),
            ("Companies", summary.unique_companies.to_string()),
            ("Locations", summary.unique_locations.to_string()),
        ],
    );

    for stat in &summary.top_technologies {
        log::sub_item(&format!("{}: {}", stat.technology, stat.count));
    }
    for insight in &report.insights {
        log::info(insight);
    }
    for recommendation in &report.recommendations {
        log::sub_item(&format!("- {recommendation}"));
    }
    Ok(())
}
