// src/pipeline/dashboard.rs

//! Dashboard overview: summary numbers, recent activity, top technologies.

use crate::error::Result;
use crate::services::MarketData;
use crate::utils::{log, settle, truncate};

/// Technologies listed in the overview.
const TOP_TECHNOLOGIES: usize = 10;

/// Print the dashboard overview.
pub async fn run_dashboard(market: &MarketData) -> Result<()> {
    log::header("Job Market Dashboard");

    let (stats, activity, technologies) = tokio::join!(
        market.dashboard_stats(),
        market.recent_activity(),
        market.technology_stats()
    );

    let stats = settle("Dashboard stats", stats)?;
    log::summary(
        "Market",
        &[
            ("Total offers", stats.total_offers.to_string()),
            ("Companies", stats.unique_companies.to_string()),
            ("Offers this week", stats.recent_offers.to_string()),
            ("Technologies", stats.unique_technologies.to_string()),
            ("Last updated", stats.last_updated.clone()),
        ],
    );
    for month in &stats.monthly_trend {
        log::sub_item(&format!("{}: {} offers", month.month, month.offers));
    }

    match settle("Recent activity", activity) {
        Ok(activity) => {
            log::info("Recent activity");
            for item in activity.iter() {
                log::sub_item(&format!(
                    "{} at {} ({})",
                    truncate(&item.position, 50),
                    item.company,
                    item.time
                ));
            }
        }
        Err(e) => log::warn(&format!("Recent activity unavailable: {e}")),
    }

    match settle("Technology stats", technologies) {
        Ok(technologies) => {
            log::info("Top technologies");
            for stat in technologies.iter().take(TOP_TECHNOLOGIES) {
                log::sub_item(&format!(
                    "{:<12} {:>5} offers ({:.1}%)",
                    stat.technology, stat.count, stat.percentage
                ));
            }
        }
        Err(e) => log::warn(&format!("Technology stats unavailable: {e}")),
    }

    Ok(())
}
