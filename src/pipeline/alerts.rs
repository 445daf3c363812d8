// src/pipeline/alerts.rs

//! Job alerts and notifications.

use crate::error::Result;
use crate::models::{AlertRequest, JobAlert};
use crate::services::MarketData;
use crate::services::market::CREATE_ALERT_ACTION;
use crate::utils::{log, settle, truncate};

/// Create a job alert and show the refreshed notification feed.
pub async fn run_alert(market: &MarketData, request: AlertRequest) -> Result<JobAlert> {
    log::header("Create Job Alert");
    log::info(&format!(
        "{} <- [{}] ({})",
        request.email,
        request.keywords.join(", "),
        request.frequency
    ));

    let alert = market.create_alert(request).await?;
    log::success(&alert.message);
    log::mutation(&market.mutations().record(CREATE_ALERT_ACTION));
    log::sub_item(&format!("Alert id: {}", alert.alert_id));
    log::sub_item(&format!("Status: {}", alert.status));

    run_notifications(market).await?;
    Ok(alert)
}

/// Print recent notifications.
pub async fn run_notifications(market: &MarketData) -> Result<()> {
    log::header("Notifications");

    let feed = settle("Notifications", market.notifications().await)?;
    for notification in &feed.notifications {
        log::info(&format!(
            "[{}] {} ({})",
            notification.priority, notification.title, notification.kind
        ));
        log::sub_item(&notification.description);
    }
    log::summary(
        "Notifications",
        &[
            ("Unread", feed.unread_count.to_string()),
            ("Last updated", feed.last_updated.clone()),
        ],
    );
    Ok(())
}

/// Print the offers matching an alert.
pub async fn run_alert_jobs(market: &MarketData, alert_id: &str) -> Result<()> {
    log::header(&format!("Matches for {alert_id}"));

    let matches = settle("Alert matches", market.alert_jobs(alert_id).await)?;
    for posting in &matches.matching_jobs {
        log::info(&format!(
            "#{} {} | {}",
            posting.id,
            truncate(&posting.title, 60),
            posting.company
        ));
    }
    log::summary(
        "Alert",
        &[
            ("Matches", matches.total_matches.to_string()),
            ("Last checked", matches.last_checked.clone()),
        ],
    );
    Ok(())
}
