//! Request and response schemas of the job market API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JobPosting;

/// Summary numbers for the dashboard header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub total_offers: u64,
    pub unique_companies: u64,
    pub recent_offers: u64,
    pub unique_technologies: u64,
    #[serde(default)]
    pub monthly_trend: Vec<MonthlyCount>,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyCount {
    pub month: String,
    pub offers: u64,
}

/// One line of the recent activity feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentActivity {
    pub company: String,
    pub position: String,
    pub time: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnologyStat {
    pub technology: String,
    pub count: u64,
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyStat {
    pub company: String,
    pub offer_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationStat {
    pub location: String,
    pub offer_count: u64,
}

/// Page returned by the server-side search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub offers: Vec<JobPosting>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalaryTrends {
    /// technology -> experience level -> average salary
    pub average_salaries: BTreeMap<String, BTreeMap<String, f64>>,
    pub trends: Vec<SalaryPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalaryPoint {
    pub month: String,
    pub avg_salary: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperienceAnalysis {
    pub total_offers: u64,
    pub junior: LevelShare,
    pub mid: LevelShare,
    pub senior: LevelShare,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelShare {
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketInsights {
    pub market_growth: MarketGrowth,
    pub hot_technologies: Vec<HotTechnology>,
    pub market_sentiment: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketGrowth {
    pub current_month: u64,
    pub previous_month: u64,
    pub growth_rate: f64,
    pub trend: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotTechnology {
    pub technology: String,
    pub demand_score: f64,
    pub trend: String,
}

/// Body of the create-alert request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRequest {
    pub email: String,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// daily, weekly or immediate
    pub frequency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobAlert {
    pub alert_id: String,
    pub email: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    pub frequency: String,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub message: String,
}

/// Offers matching a saved alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertJobs {
    pub alert_id: String,
    pub matching_jobs: Vec<JobPosting>,
    pub total_matches: u64,
    pub last_checked: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub timestamp: String,
    pub priority: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketReport {
    pub report_period: String,
    pub generated_at: String,
    pub summary: ReportSummary,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub total_offers: u64,
    pub unique_companies: u64,
    pub unique_locations: u64,
    #[serde(default)]
    pub top_technologies: Vec<TechnologyStat>,
    #[serde(default)]
    pub top_companies: Vec<CompanyStat>,
    #[serde(default)]
    pub top_locations: Vec<LocationStat>,
}

/// Body of the scan request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanRequest {
    pub pages: u32,
}

impl ScanRequest {
    /// Page range accepted by the scraper.
    pub const PAGE_RANGE: std::ops::RangeInclusive<u32> = 1..=10;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanResult {
    pub message: String,
}

/// Export format understood by the export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Result of an export; `data` is a CSV string or an array of offers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportResult {
    pub format: String,
    pub data: Value,
    pub total_records: u64,
    #[serde(default)]
    pub filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_field() {
        let json = r#"{
            "type": "new_job",
            "title": "New Rust Developer position at Acme",
            "description": "New opportunity in Remote",
            "timestamp": "2024-05-02T10:15:30",
            "priority": "medium"
        }"#;
        let notification: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(notification.kind, "new_job");
    }

    #[test]
    fn test_alert_request_omits_missing_fields() {
        let request = AlertRequest {
            email: "dev@example.com".to_string(),
            keywords: vec!["rust".to_string()],
            location: None,
            company: None,
            frequency: "daily".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("location").is_none());
        assert_eq!(value["keywords"][0], "rust");
    }
}
