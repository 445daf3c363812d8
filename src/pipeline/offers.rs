// src/pipeline/offers.rs

//! Offer browsing over the cached offer list.

use std::sync::Arc;

use crate::error::Result;
use crate::models::FilterCriteria;
use crate::services::{MarketData, SearchResults};
use crate::utils::{log, settle, truncate};

/// Search the cached offer list locally and print one page of results.
pub async fn run_offers(
    market: &MarketData,
    criteria: &FilterCriteria,
    page: usize,
    page_size: usize,
) -> Result<SearchResults> {
    log::header("Job Offers");

    let view = market.search_local(criteria, page, page_size).await;
    let results = settle("Offers", view)?;

    for adjustment in &results.adjustments {
        log::warn(&format!("Criteria adjusted: {adjustment}"));
    }

    if results.items.is_empty() {
        log::info("No offers match the given criteria.");
    }
    for item in &results.items {
        let posting = &item.posting;
        log::info(&format!(
            "#{} {} | {} | {}",
            posting.id,
            truncate(&posting.title, 60),
            if posting.company.is_empty() { "-" } else { posting.company.as_str() },
            if posting.location.is_empty() { "-" } else { posting.location.as_str() },
        ));
        if !item.technologies.is_empty() {
            log::sub_item(&item.technologies.join(", "));
        }
        if !posting.url.is_empty() {
            log::sub_item(&posting.url);
        }
    }

    log::summary(
        "Results",
        &[
            ("Matches", results.total.to_string()),
            (
                "Page",
                format!("{}/{}", results.page, results.page_count.max(1)),
            ),
            ("More", if results.has_next { "yes" } else { "no" }.to_string()),
        ],
    );

    Ok(Arc::unwrap_or_clone(results))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::Config;
    use crate::transport::testing::ScriptedTransport;

    #[tokio::test(start_paused = true)]
    async fn test_run_offers_returns_page() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(
            "/offers/",
            Ok(json!([
                {
                    "id": 1,
                    "title": "Rust Developer",
                    "company": "Acme",
                    "location": "Remote",
                    "description": "Rust, Docker and AWS",
                    "url": "https://jobs.example.com/1",
                    "scraped_at": "2024-05-01T09:00:00Z"
                },
                {
                    "id": 2,
                    "title": "PHP Developer",
                    "company": null,
                    "location": null,
                    "description": "Laravel",
                    "url": null,
                    "scraped_at": "2024-05-02 09:00:00"
                }
            ])),
        );
        let market = MarketData::new(transport, &Config::default());

        let results = run_offers(&market, &FilterCriteria::text("rust"), 1, 20)
            .await
            .unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.items[0].technologies, vec!["Rust", "Docker", "AWS"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_offers_fails_without_data() {
        let transport = Arc::new(ScriptedTransport::new());
        let market = MarketData::new(transport, &Config::default());

        let result = run_offers(&market, &FilterCriteria::default(), 1, 20).await;
        assert!(result.is_err());
    }
}
