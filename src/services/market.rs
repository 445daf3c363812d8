// src/services/market.rs

//! Market data facade.
//!
//! Binds every API read to one cache key and every write to a mutation with
//! its declared invalidation set. Consumers only talk to [`MarketData`].

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{MarketApi, SearchEngine, SearchResults, TechnologyTagger};
use crate::cache::{CacheEntry, CachePolicy, KeyFilter, QueryCache, QueryKey, QueryOptions, QueryStatus};
use crate::error::{AppError, Result, TransportError};
use crate::models::{
    AlertJobs, AlertRequest, CompanyStat, Config, DashboardStats, ExperienceAnalysis,
    ExportFormat, ExportResult, FilterCriteria, JobAlert, JobPosting, LocationStat,
    MarketInsights, MarketReport, NotificationsResponse, RecentActivity, SalaryTrends,
    ScanRequest, ScanResult, SearchResponse, TechnologyStat,
};
use crate::mutation::{Mutation, MutationCoordinator};
use crate::transport::{HttpTransport, Transport};

/// Cache keys of the market queries.
pub mod keys {
    use crate::cache::QueryKey;
    use crate::models::FilterCriteria;

    pub const DASHBOARD_STATS: &str = "dashboard-stats";
    pub const RECENT_ACTIVITY: &str = "recent-activity";
    pub const TECHNOLOGY_STATS: &str = "technology-stats";
    pub const OFFERS: &str = "offers";
    pub const COMPANY_STATS: &str = "company-stats";
    pub const LOCATION_STATS: &str = "location-stats";
    pub const SALARY_TRENDS: &str = "salary-trends";
    pub const EXPERIENCE_ANALYSIS: &str = "experience-analysis";
    pub const MARKET_INSIGHTS: &str = "market-insights";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const MARKET_REPORT: &str = "market-report";
    pub const ALERT_JOBS: &str = "alert-jobs";

    pub fn offers(skip: usize, limit: usize) -> QueryKey {
        QueryKey::from(OFFERS).with(skip).with(limit)
    }

    /// `["offers", "search", "q=…", …, skip, limit]`
    pub fn offer_search(criteria: &FilterCriteria, skip: usize, limit: usize) -> QueryKey {
        criteria
            .query_pairs()
            .into_iter()
            .fold(QueryKey::from([OFFERS, "search"]), |key, (name, value)| {
                key.with(format!("{name}={value}"))
            })
            .with(skip)
            .with(limit)
    }

    pub fn market_report(period: &str) -> QueryKey {
        QueryKey::from(MARKET_REPORT).with(period)
    }

    pub fn alert_jobs(alert_id: &str) -> QueryKey {
        QueryKey::from(ALERT_JOBS).with(alert_id)
    }
}

pub const SCAN_ACTION: &str = "trigger-scan";
pub const CREATE_ALERT_ACTION: &str = "create-alert";
pub const EXPORT_ACTION: &str = "export-jobs";

/// Typed view of a cache entry: last-known-good data plus the latest error.
#[derive(Debug, Clone)]
pub struct QueryView<T> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<TransportError>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T: Send + Sync + 'static> QueryView<T> {
    pub fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            status: entry.status,
            data: entry.data::<T>(),
            error: entry.error.clone(),
            fetched_at: entry.fetched_at,
        }
    }
}

impl<T> QueryView<T> {
    /// The data, or the error when there is nothing to show.
    pub fn into_result(self) -> std::result::Result<Arc<T>, TransportError> {
        match (self.data, self.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(error),
            (None, None) => Err(TransportError::decode("cache", "query has not settled")),
        }
    }

    /// Whether the data shown is older than a failed refresh.
    pub fn is_degraded(&self) -> bool {
        self.data.is_some() && self.error.is_some()
    }
}

/// Cached reads and coordinated writes against the job market API.
pub struct MarketData {
    api: MarketApi,
    cache: QueryCache,
    mutations: MutationCoordinator,
    engine: SearchEngine,
    offers_limit: usize,
    scan: Mutation<ScanRequest, ScanResult>,
    create_alert: Mutation<AlertRequest, JobAlert>,
    export: Mutation<(ExportFormat, FilterCriteria), ExportResult>,
}

impl MarketData {
    /// Build the data layer over HTTP from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.api)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        let api = MarketApi::new(transport);
        let cache = QueryCache::new(CachePolicy::from(&config.cache));
        let engine = SearchEngine::new(
            TechnologyTagger::from_config(&config.tagger),
            config.search.page_size,
        );

        let scan = {
            let api = api.clone();
            Mutation::new(SCAN_ACTION, move |request: ScanRequest| {
                let api = api.clone();
                async move { api.trigger_scan(request).await }
            })
            .invalidates(keys::DASHBOARD_STATS)
            .invalidates(keys::RECENT_ACTIVITY)
            .invalidates(keys::TECHNOLOGY_STATS)
            .invalidates(KeyFilter::prefix(keys::OFFERS))
        };

        let create_alert = {
            let api = api.clone();
            Mutation::new(CREATE_ALERT_ACTION, move |request: AlertRequest| {
                let api = api.clone();
                async move { api.create_alert(&request).await }
            })
            .invalidates(keys::NOTIFICATIONS)
        };

        let export = {
            let api = api.clone();
            Mutation::new(
                EXPORT_ACTION,
                move |(format, filters): (ExportFormat, FilterCriteria)| {
                    let api = api.clone();
                    async move { api.export(format, &filters).await }
                },
            )
        };

        Self {
            mutations: MutationCoordinator::new(cache.clone()),
            api,
            cache,
            engine,
            offers_limit: config.search.offers_limit,
            scan,
            create_alert,
            export,
        }
    }

    pub fn api(&self) -> &MarketApi {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Drop every cached entry.
    pub fn shutdown(&self) {
        self.cache.clear();
    }

    async fn read<T, F, Fut>(&self, key: QueryKey, call: F) -> QueryView<T>
    where
        T: Send + Sync + 'static,
        F: Fn(MarketApi) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, TransportError>> + Send + 'static,
    {
        let api = self.api.clone();
        let entry = self
            .cache
            .fetch(&key, move || call(api.clone()), QueryOptions::default())
            .await;
        QueryView::from_entry(&entry)
    }

    // Reads

    pub async fn dashboard_stats(&self) -> QueryView<DashboardStats> {
        self.read(QueryKey::from(keys::DASHBOARD_STATS), |api| async move {
            api.dashboard_stats().await
        })
        .await
    }

    pub async fn recent_activity(&self) -> QueryView<Vec<RecentActivity>> {
        self.read(QueryKey::from(keys::RECENT_ACTIVITY), |api| async move {
            api.recent_activity().await
        })
        .await
    }

    pub async fn technology_stats(&self) -> QueryView<Vec<TechnologyStat>> {
        self.read(QueryKey::from(keys::TECHNOLOGY_STATS), |api| async move {
            api.technology_stats().await
        })
        .await
    }

    pub async fn offers(&self, skip: usize, limit: usize) -> QueryView<Vec<JobPosting>> {
        self.read(keys::offers(skip, limit), move |api| async move {
            api.offers(skip, limit).await
        })
        .await
    }

    pub async fn search_offers(
        &self,
        criteria: &FilterCriteria,
        skip: usize,
        limit: usize,
    ) -> QueryView<SearchResponse> {
        let key = keys::offer_search(criteria, skip, limit);
        let criteria = criteria.clone();
        self.read(key, move |api| {
            let criteria = criteria.clone();
            async move { api.search_offers(&criteria, skip, limit).await }
        })
        .await
    }

    pub async fn company_stats(&self) -> QueryView<Vec<CompanyStat>> {
        self.read(QueryKey::from(keys::COMPANY_STATS), |api| async move {
            api.company_stats().await
        })
        .await
    }

    pub async fn location_stats(&self) -> QueryView<Vec<LocationStat>> {
        self.read(QueryKey::from(keys::LOCATION_STATS), |api| async move {
            api.location_stats().await
        })
        .await
    }

    pub async fn salary_trends(&self) -> QueryView<SalaryTrends> {
        self.read(QueryKey::from(keys::SALARY_TRENDS), |api| async move {
            api.salary_trends().await
        })
        .await
    }

    pub async fn experience_analysis(&self) -> QueryView<ExperienceAnalysis> {
        self.read(QueryKey::from(keys::EXPERIENCE_ANALYSIS), |api| async move {
            api.experience_analysis().await
        })
        .await
    }

    pub async fn market_insights(&self) -> QueryView<MarketInsights> {
        self.read(QueryKey::from(keys::MARKET_INSIGHTS), |api| async move {
            api.market_insights().await
        })
        .await
    }

    pub async fn notifications(&self) -> QueryView<NotificationsResponse> {
        self.read(QueryKey::from(keys::NOTIFICATIONS), |api| async move {
            api.notifications().await
        })
        .await
    }

    pub async fn market_report(&self, period: &str) -> QueryView<MarketReport> {
        let owned = period.to_string();
        self.read(keys::market_report(period), move |api| {
            let period = owned.clone();
            async move { api.market_report(&period).await }
        })
        .await
    }

    pub async fn alert_jobs(&self, alert_id: &str) -> QueryView<AlertJobs> {
        let owned = alert_id.to_string();
        self.read(keys::alert_jobs(alert_id), move |api| {
            let alert_id = owned.clone();
            async move { api.alert_jobs(&alert_id).await }
        })
        .await
    }

    // Derived views over the cached offer list

    /// Filter, sort and paginate the cached offer list locally.
    ///
    /// When refreshing the list fails, the search runs over the
    /// last-known-good list and the view carries the error.
    pub async fn search_local(
        &self,
        criteria: &FilterCriteria,
        page: usize,
        page_size: usize,
    ) -> QueryView<SearchResults> {
        self.derive(|postings| self.engine.search(postings, criteria, page, page_size))
            .await
    }

    /// Technology demand computed from the cached offer list.
    pub async fn technology_demand(&self) -> QueryView<Vec<TechnologyStat>> {
        self.derive(|postings| self.engine.tagger().demand(postings))
            .await
    }

    async fn derive<T>(&self, compute: impl FnOnce(&[JobPosting]) -> T) -> QueryView<T> {
        let offers = self.offers(0, self.offers_limit).await;
        QueryView {
            status: offers.status,
            data: offers
                .data
                .as_deref()
                .map(|postings| Arc::new(compute(postings.as_slice()))),
            error: offers.error,
            fetched_at: offers.fetched_at,
        }
    }

    // Writes

    /// Ask the backend to scrape `pages` listing pages (1 to 10).
    pub async fn scan(&self, pages: u32) -> Result<ScanResult> {
        if !ScanRequest::PAGE_RANGE.contains(&pages) {
            return Err(AppError::validation(format!(
                "pages must be between {} and {}, got {}",
                ScanRequest::PAGE_RANGE.start(),
                ScanRequest::PAGE_RANGE.end(),
                pages
            )));
        }
        self.mutations.run(&self.scan, ScanRequest { pages }).await
    }

    pub async fn create_alert(&self, request: AlertRequest) -> Result<JobAlert> {
        if !request.email.contains('@') {
            return Err(AppError::validation(format!(
                "invalid email address '{}'",
                request.email
            )));
        }
        if request.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(AppError::validation("at least one keyword is required"));
        }
        self.mutations.run(&self.create_alert, request).await
    }

    pub async fn export(&self, format: ExportFormat, filters: FilterCriteria) -> Result<ExportResult> {
        self.mutations.run(&self.export, (format, filters)).await
    }

    /// Uncached connectivity probe.
    pub async fn health(&self) -> Result<serde_json::Value> {
        Ok(self.api.health().await?)
    }
}
