// src/pipeline/analytics.rs

//! Market analytics report.

use crate::error::Result;
use crate::services::MarketData;
use crate::utils::{log, settle};

const TOP_N: usize = 10;

/// Print company, location, technology, experience and salary analytics.
///
/// Sections whose query fails are reported and skipped; the run fails only
/// when every section is unavailable.
pub async fn run_analytics(market: &MarketData) -> Result<()> {
    log::header("Market Analytics");

    let (companies, locations, experience, salaries, insights) = tokio::join!(
        market.company_stats(),
        market.location_stats(),
        market.experience_analysis(),
        market.salary_trends(),
        market.market_insights(),
    );
    let demand = market.technology_demand().await;

    let total = 6;
    let mut failures = Vec::new();

    log::step(1, total, "Top companies");
    match settle("Company stats", companies) {
        Ok(companies) => {
            for stat in companies.iter().take(TOP_N) {
                log::sub_item(&format!("{:<30} {:>5}", stat.company, stat.offer_count));
            }
        }
        Err(e) => failures.push(e),
    }

    log::step(2, total, "Top locations");
    match settle("Location stats", locations) {
        Ok(locations) => {
            for stat in locations.iter().take(TOP_N) {
                log::sub_item(&format!("{:<30} {:>5}", stat.location, stat.offer_count));
            }
        }
        Err(e) => failures.push(e),
    }

    log::step(3, total, "Technology demand (local)");
    match settle("Technology demand", demand) {
        Ok(demand) => {
            for stat in demand.iter().take(TOP_N) {
                log::sub_item(&format!(
                    "{:<12} {:>5} offers ({:.1}%)",
                    stat.technology, stat.count, stat.percentage
                ));
            }
        }
        Err(e) => failures.push(e),
    }

    log::step(4, total, "Experience levels");
    match settle("Experience analysis", experience) {
        Ok(analysis) => {
            for (level, share) in [
                ("junior", &analysis.junior),
                ("mid", &analysis.mid),
                ("senior", &analysis.senior),
            ] {
                log::sub_item(&format!(
                    "{:<8} {:>5} ({:.1}%)",
                    level, share.count, share.percentage
                ));
            }
        }
        Err(e) => failures.push(e),
    }

    log::step(5, total, "Average salaries");
    match settle("Salary trends", salaries) {
        Ok(trends) => {
            for (technology, levels) in &trends.average_salaries {
                let by_level: Vec<String> = levels
                    .iter()
                    .map(|(level, avg)| format!("{level}: {avg:.0}"))
                    .collect();
                log::sub_item(&format!("{technology}: {}", by_level.join(", ")));
            }
            for point in &trends.trends {
                log::sub_item(&format!("{} avg {:.0}", point.month, point.avg_salary));
            }
        }
        Err(e) => failures.push(e),
    }

    log::step(6, total, "Insights");
    match settle("Market insights", insights) {
        Ok(insights) => {
            let growth = &insights.market_growth;
            log::sub_item(&format!(
                "Growth {:+.1}% ({} -> {} offers, {})",
                growth.growth_rate, growth.previous_month, growth.current_month, growth.trend
            ));
            log::sub_item(&format!("Sentiment: {}", insights.market_sentiment));
            for hot in &insights.hot_technologies {
                log::sub_item(&format!(
                    "Hot: {} (score {:.1}, {})",
                    hot.technology, hot.demand_score, hot.trend
                ));
            }
            for recommendation in &insights.recommendations {
                log::sub_item(&format!("- {recommendation}"));
            }
        }
        Err(e) => failures.push(e),
    }

    for failure in &failures {
        log::warn(&format!("Section unavailable: {failure}"));
    }
    if failures.len() == total {
        if let Some(first) = failures.into_iter().next() {
            return Err(first.into());
        }
    }
    Ok(())
}
