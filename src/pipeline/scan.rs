// src/pipeline/scan.rs

//! Trigger a backend scan and refresh the views it affects.

use crate::error::Result;
use crate::models::ScanResult;
use crate::services::MarketData;
use crate::services::market::SCAN_ACTION;
use crate::utils::{log, settle};

/// Run a scan of `pages` listing pages, then re-read the dashboard.
///
/// The scan invalidates the dashboard and offer queries, so the second read
/// goes back to the API.
pub async fn run_scan(market: &MarketData, pages: u32) -> Result<ScanResult> {
    log::header("Market Scan");

    log::step(1, 3, "Reading current dashboard");
    let before = market
        .dashboard_stats()
        .await
        .data
        .map(|stats| stats.total_offers);

    log::step(2, 3, &format!("Scanning {pages} page(s)"));
    let result = market.scan(pages).await.inspect_err(|e| {
        log::error(&format!("Scan failed: {e}"));
    })?;
    log::success(&result.message);
    log::mutation(&market.mutations().record(SCAN_ACTION));

    log::step(3, 3, "Refreshing dashboard");
    let after = settle("Dashboard stats", market.dashboard_stats().await)?;

    log::summary(
        "Scan",
        &[
            (
                "Offers before",
                before.map_or_else(|| "unknown".to_string(), |n| n.to_string()),
            ),
            ("Offers after", after.total_offers.to_string()),
        ],
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::error::AppError;
    use crate::models::Config;
    use crate::transport::testing::ScriptedTransport;

    fn stats(total: u64) -> serde_json::Value {
        json!({
            "total_offers": total,
            "unique_companies": 1,
            "recent_offers": 0,
            "unique_technologies": 0,
            "last_updated": "2024-05-02T10:15:30"
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_rereads_dashboard() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .reply("/dashboard/stats/", Ok(stats(5)))
            .reply("/dashboard/stats/", Ok(stats(25)))
            .reply("/scrape/", Ok(json!({ "message": "Scraped 20 offers" })));
        let market = MarketData::new(transport.clone(), &Config::default());

        let result = run_scan(&market, 1).await.unwrap();
        assert_eq!(result.message, "Scraped 20 offers");
        assert_eq!(transport.calls_to("/dashboard/stats/"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_out_of_range() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply("/dashboard/stats/", Ok(stats(5)));
        let market = MarketData::new(transport.clone(), &Config::default());

        let result = run_scan(&market, 42).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(transport.calls_to("/scrape/"), 0);
    }
}
