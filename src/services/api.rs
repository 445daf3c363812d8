// src/services/api.rs

//! Typed bindings for the job market API.
//!
//! One method per logical read or write. Each method sends a single request
//! through the configured [`Transport`] and decodes the JSON reply.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TransportError;
use crate::models::{
    AlertJobs, AlertRequest, CompanyStat, DashboardStats, ExperienceAnalysis, ExportFormat,
    ExportResult, FilterCriteria, JobAlert, JobPosting, LocationStat, MarketInsights,
    MarketReport, NotificationsResponse, RecentActivity, SalaryTrends, ScanRequest, ScanResult,
    SearchResponse, TechnologyStat,
};
use crate::transport::{RequestOptions, Transport};

type ApiResult<T> = Result<T, TransportError>;

/// Client for the remote job market API.
#[derive(Clone)]
pub struct MarketApi {
    transport: Arc<dyn Transport>,
}

impl MarketApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ApiResult<T> {
        let value = self.transport.request(path, options).await?;
        serde_json::from_value(value).map_err(|e| TransportError::decode(path, e))
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| TransportError::decode(path, e))?;
        self.get(path, RequestOptions::post(body)).await
    }

    // Dashboard

    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.get("/dashboard/stats/", RequestOptions::get()).await
    }

    pub async fn recent_activity(&self) -> ApiResult<Vec<RecentActivity>> {
        self.get("/dashboard/recent-activity/", RequestOptions::get())
            .await
    }

    // Offers

    pub async fn offers(&self, skip: usize, limit: usize) -> ApiResult<Vec<JobPosting>> {
        let options = RequestOptions::get()
            .query("skip", skip)
            .query("limit", limit);
        self.get("/offers/", options).await
    }

    /// Server-side faceted search. Blank criteria fields are not sent.
    pub async fn search_offers(
        &self,
        criteria: &FilterCriteria,
        skip: usize,
        limit: usize,
    ) -> ApiResult<SearchResponse> {
        let mut options = RequestOptions::get();
        for (name, value) in criteria.query_pairs() {
            options = options.query(name, value);
        }
        let options = options.query("skip", skip).query("limit", limit);
        self.get("/offers/search/", options).await
    }

    pub async fn technology_stats(&self) -> ApiResult<Vec<TechnologyStat>> {
        self.get("/stats/technologies/", RequestOptions::get()).await
    }

    // Analytics

    pub async fn company_stats(&self) -> ApiResult<Vec<CompanyStat>> {
        self.get("/analytics/company-stats/", RequestOptions::get())
            .await
    }

    pub async fn location_stats(&self) -> ApiResult<Vec<LocationStat>> {
        self.get("/analytics/location-stats/", RequestOptions::get())
            .await
    }

    pub async fn salary_trends(&self) -> ApiResult<SalaryTrends> {
        self.get("/analytics/salary-trends/", RequestOptions::get())
            .await
    }

    pub async fn experience_analysis(&self) -> ApiResult<ExperienceAnalysis> {
        self.get("/analytics/experience-analysis/", RequestOptions::get())
            .await
    }

    pub async fn market_insights(&self) -> ApiResult<MarketInsights> {
        self.get("/analytics/market-insights/", RequestOptions::get())
            .await
    }

    // Alerts and notifications

    pub async fn create_alert(&self, request: &AlertRequest) -> ApiResult<JobAlert> {
        self.post("/alerts/create/", request).await
    }

    pub async fn alert_jobs(&self, alert_id: &str) -> ApiResult<AlertJobs> {
        if alert_id.is_empty() || alert_id.contains('/') {
            return Err(TransportError::InvalidEndpoint {
                path: format!("/alerts/{alert_id}/jobs/"),
            });
        }
        self.get(&format!("/alerts/{alert_id}/jobs/"), RequestOptions::get())
            .await
    }

    pub async fn notifications(&self) -> ApiResult<NotificationsResponse> {
        self.get("/notifications/recent/", RequestOptions::get())
            .await
    }

    // Reports, export and scraping

    pub async fn market_report(&self, period: &str) -> ApiResult<MarketReport> {
        let options = RequestOptions::get().query("period", period);
        self.get("/reports/market-summary/", options).await
    }

    /// Export offers. Non-empty `filters` are sent as a JSON string.
    pub async fn export(
        &self,
        format: ExportFormat,
        filters: &FilterCriteria,
    ) -> ApiResult<ExportResult> {
        let mut options = RequestOptions::get().query("format", format.as_str());
        if !filters.is_empty() {
            let encoded = serde_json::to_string(filters)
                .map_err(|e| TransportError::decode("/export/jobs/", e))?;
            options = options.query("filters", encoded);
        }
        self.get("/export/jobs/", options).await
    }

    pub async fn trigger_scan(&self, request: ScanRequest) -> ApiResult<ScanResult> {
        self.post("/scrape/", &request).await
    }

    pub async fn health(&self) -> ApiResult<Value> {
        self.get("/health/", RequestOptions::get()).await
    }
}
