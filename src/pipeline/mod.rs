//! Pipeline entry points for CLI operations.
//!
//! - `run_dashboard`: Summary numbers, recent activity, top technologies
//! - `run_offers`: Local search over the cached offer list
//! - `run_analytics`: Company, location, salary and experience analytics
//! - `run_scan`: Trigger a scan and refresh the dashboard
//! - `run_alert` / `run_notifications` / `run_alert_jobs`: Job alerts
//! - `run_export` / `run_report`: Exports and market reports
//! - `run_validate` / `run_health`: Configuration and API checks

pub mod alerts;
pub mod analytics;
pub mod dashboard;
pub mod export;
pub mod offers;
pub mod scan;
pub mod validate;

pub use alerts::{run_alert, run_alert_jobs, run_notifications};
pub use analytics::run_analytics;
pub use dashboard::run_dashboard;
pub use export::{run_export, run_report};
pub use offers::run_offers;
pub use scan::run_scan;
pub use validate::{run_health, run_validate};
