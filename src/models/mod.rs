// src/models/mod.rs

//! Domain models for the market data layer.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod api;
mod config;
mod criteria;
mod posting;

// Re-export all public types
pub use api::{
    AlertJobs, AlertRequest, CompanyStat, DashboardStats, ExperienceAnalysis, ExportFormat,
    ExportResult, HotTechnology, JobAlert, LevelShare, LocationStat, MarketGrowth, MarketInsights,
    MarketReport, MonthlyCount, Notification, NotificationsResponse, RecentActivity,
    ReportSummary, SalaryPoint, SalaryTrends, ScanRequest, ScanResult, SearchResponse,
    TechnologyStat,
};
pub use config::{ApiConfig, CacheConfig, Config, LoggingConfig, SearchConfig, TaggerConfig};
pub(crate) use criteria::non_blank;
pub use criteria::{FilterCriteria, SortKey, SortOrder};
pub use posting::{ExperienceLevel, JobPosting, JobType, SalaryRange, parse_timestamp};
