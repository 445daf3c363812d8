// src/utils/log.rs

//! Console output for the CLI pipelines.
//!
//! Lines carry a clock time and a short mark (`ok`, `info`, `WARN`, `FAIL`).
//! Besides plain messages this knows how to describe a cached query view and
//! a finished mutation. Library diagnostics go through the `log` facade.

use std::sync::OnceLock;

use ::log::LevelFilter;
use chrono::{Local, Utc};

use crate::cache::QueryStatus;
use crate::mutation::{MutationRecord, MutationStatus};
use crate::services::QueryView;
use crate::utils::format_age;

static LEVEL: OnceLock<LevelFilter> = OnceLock::new();

/// Set the console level from a name such as `debug` or `warn`.
/// Unknown names keep `info`. Only the first call has an effect.
pub fn init(level: &str) {
    let _ = LEVEL.set(level.parse().unwrap_or(LevelFilter::Info));
}

fn enabled(level: ::log::Level) -> bool {
    level <= LEVEL.get().copied().unwrap_or(LevelFilter::Info)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Ok,
    Info,
    Warn,
    Fail,
}

impl Mark {
    fn label(self) -> &'static str {
        match self {
            Mark::Ok => "  ok",
            Mark::Info => "info",
            Mark::Warn => "WARN",
            Mark::Fail => "FAIL",
        }
    }

    fn level(self) -> ::log::Level {
        match self {
            Mark::Ok | Mark::Info => ::log::Level::Info,
            Mark::Warn => ::log::Level::Warn,
            Mark::Fail => ::log::Level::Error,
        }
    }
}

fn render(mark: Mark, message: &str) -> String {
    format!("{} {} {}", Local::now().format("%H:%M:%S"), mark.label(), message)
}

fn emit(mark: Mark, message: &str) {
    if !enabled(mark.level()) {
        return;
    }
    match mark {
        Mark::Warn | Mark::Fail => eprintln!("{}", render(mark, message)),
        Mark::Ok | Mark::Info => println!("{}", render(mark, message)),
    }
}

pub fn info(message: &str) {
    emit(Mark::Info, message);
}

pub fn warn(message: &str) {
    emit(Mark::Warn, message);
}

pub fn error(message: &str) {
    emit(Mark::Fail, message);
}

pub fn success(message: &str) {
    emit(Mark::Ok, message);
}

/// `(2/6) Top locations`
pub fn step(current: usize, total: usize, message: &str) {
    emit(Mark::Info, &format!("({current}/{total}) {message}"));
}

pub fn header(title: &str) {
    if enabled(::log::Level::Info) {
        println!();
        println!("== {title} ==");
    }
}

/// Indented detail line under the previous message.
pub fn sub_item(message: &str) {
    if enabled(::log::Level::Info) {
        println!("         {message}");
    }
}

/// Aligned `name: value` block.
pub fn summary(title: &str, items: &[(&str, String)]) {
    if !enabled(::log::Level::Info) {
        return;
    }
    let width = items.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    println!("-- {title}");
    for (name, value) in items {
        println!("   {name:<width$}  {value}");
    }
}

/// Report the state of a cached query.
///
/// Fresh results are only shown at debug level; stale data kept after a
/// failed refresh is flagged next to the error that caused it.
pub fn view<T>(label: &str, view: &QueryView<T>) {
    let (mark, line) = describe_view(label, view);
    if mark == Mark::Ok {
        ::log::debug!("{line}");
    } else {
        emit(mark, &line);
    }
}

fn describe_view<T>(label: &str, view: &QueryView<T>) -> (Mark, String) {
    let age = view
        .fetched_at
        .map(|at| format_age(at, Utc::now()))
        .unwrap_or_else(|| "never".to_string());

    match (&view.data, &view.error, view.status) {
        (Some(_), Some(error), _) => (
            Mark::Warn,
            format!("{label}: showing data from {age} [refresh failed: {error}]"),
        ),
        (None, Some(error), _) => (Mark::Fail, format!("{label}: unavailable [{error}]")),
        (_, None, QueryStatus::Loading) => (Mark::Info, format!("{label}: still loading")),
        (Some(_), None, _) => (Mark::Ok, format!("{label}: fetched {age}")),
        (None, None, _) => (Mark::Info, format!("{label}: no data yet")),
    }
}

/// Report how a mutation ended and which queries it sent back to the API.
pub fn mutation(record: &MutationRecord) {
    if let Some((mark, line)) = describe_mutation(record) {
        emit(mark, &line);
    }
}

fn describe_mutation(record: &MutationRecord) -> Option<(Mark, String)> {
    match record.status {
        MutationStatus::Idle => None,
        MutationStatus::Pending => Some((Mark::Info, format!("{}: running", record.action))),
        MutationStatus::Success if record.invalidates.is_empty() => {
            Some((Mark::Ok, format!("{}: done", record.action)))
        }
        MutationStatus::Success => {
            let keys: Vec<String> = record.invalidates.iter().map(ToString::to_string).collect();
            Some((
                Mark::Ok,
                format!("{}: done, refreshing {}", record.action, keys.join(", ")),
            ))
        }
        MutationStatus::Error => {
            let cause = record
                .error
                .as_ref()
                .map_or_else(|| "unknown error".to_string(), ToString::to_string);
            Some((
                Mark::Fail,
                format!("{}: failed, cache untouched [{cause}]", record.action),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::KeyFilter;
    use crate::error::TransportError;

    fn view_of(
        status: QueryStatus,
        data: Option<u32>,
        error: Option<TransportError>,
    ) -> QueryView<u32> {
        QueryView {
            status,
            data: data.map(Arc::new),
            error,
            fetched_at: Some(Utc::now() - chrono::Duration::minutes(3)),
        }
    }

    fn record(status: MutationStatus) -> MutationRecord {
        MutationRecord {
            action: "trigger-scan".to_string(),
            status,
            invalidates: vec![
                KeyFilter::from("dashboard-stats"),
                KeyFilter::prefix("offers"),
            ],
            error: None,
            finished_at: None,
        }
    }

    #[test]
    fn test_degraded_view_names_the_failure() {
        let view = view_of(
            QueryStatus::Error,
            Some(7),
            Some(TransportError::http(503, "Service Unavailable")),
        );
        let (mark, line) = describe_view("Dashboard stats", &view);
        assert_eq!(mark, Mark::Warn);
        assert_eq!(
            line,
            "Dashboard stats: showing data from 3m ago [refresh failed: API request failed: 503 Service Unavailable]"
        );
    }

    #[test]
    fn test_view_without_data() {
        let failed = view_of(
            QueryStatus::Error,
            None,
            Some(TransportError::connectivity("http://127.0.0.1:8001/notifications/")),
        );
        assert_eq!(describe_view("Notifications", &failed).0, Mark::Fail);

        let loading = view_of(QueryStatus::Loading, None, None);
        assert_eq!(
            describe_view("Notifications", &loading),
            (Mark::Info, "Notifications: still loading".to_string())
        );
    }

    #[test]
    fn test_fresh_view() {
        let view = view_of(QueryStatus::Success, Some(1), None);
        assert_eq!(
            describe_view("Offers", &view),
            (Mark::Ok, "Offers: fetched 3m ago".to_string())
        );
    }

    #[test]
    fn test_mutation_outcomes() {
        assert_eq!(describe_mutation(&record(MutationStatus::Idle)), None);
        assert_eq!(
            describe_mutation(&record(MutationStatus::Success)),
            Some((
                Mark::Ok,
                "trigger-scan: done, refreshing [dashboard-stats], [offers]*".to_string()
            ))
        );

        let mut failed = record(MutationStatus::Error);
        failed.error = Some(TransportError::http(500, "Internal Server Error"));
        let (mark, line) = describe_mutation(&failed).unwrap();
        assert_eq!(mark, Mark::Fail);
        assert!(line.ends_with("cache untouched [API request failed: 500 Internal Server Error]"));
    }

    #[test]
    fn test_marks_map_to_levels() {
        assert_eq!(Mark::Ok.level(), ::log::Level::Info);
        assert_eq!(Mark::Warn.level(), ::log::Level::Warn);
        assert_eq!(Mark::Fail.level(), ::log::Level::Error);
        assert!(render(Mark::Warn, "x").ends_with("WARN x"));
    }
}
