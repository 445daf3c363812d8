// src/services/search.rs

//! Client-side filtering, sorting and pagination of job postings.
//!
//! The engine never performs I/O: it works over a collection that is already
//! cached. Malformed criteria are recovered by falling back to defaults and
//! every recovery is reported in [`SearchResults::adjustments`].

use std::cmp::Ordering;

use serde::Serialize;

use super::TechnologyTagger;
use crate::models::{
    ExperienceLevel, FilterCriteria, JobPosting, JobType, SortKey, SortOrder, non_blank,
};

/// A posting annotated with its technology tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedPosting {
    #[serde(flatten)]
    pub posting: JobPosting,
    pub technologies: Vec<String>,
}

/// One page of a filtered, sorted collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub items: Vec<TaggedPosting>,
    /// Size of the whole filtered set
    pub total: usize,
    /// 1-indexed page actually returned
    pub page: usize,
    pub page_count: usize,
    pub has_next: bool,
    pub has_prev: bool,
    /// Criteria that were malformed and replaced by defaults
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<String>,
}

/// Criteria after validation.
#[derive(Debug)]
struct Plan {
    q: Option<String>,
    company: Option<String>,
    location: Option<String>,
    technology: Option<String>,
    min_salary: Option<f64>,
    max_salary: Option<f64>,
    job_type: Option<JobType>,
    experience: Option<ExperienceLevel>,
    sort_key: SortKey,
    sort_order: SortOrder,
    adjustments: Vec<String>,
}

impl Plan {
    fn from_criteria(criteria: &FilterCriteria) -> Self {
        let lowered = |value: &Option<String>| non_blank(value).map(str::to_lowercase);
        let mut plan = Plan {
            q: lowered(&criteria.q),
            company: lowered(&criteria.company),
            location: lowered(&criteria.location),
            technology: lowered(&criteria.technology),
            min_salary: criteria.min_salary,
            max_salary: criteria.max_salary,
            job_type: None,
            experience: None,
            sort_key: SortKey::default(),
            sort_order: SortKey::default().natural_order(),
            adjustments: Vec::new(),
        };

        plan.job_type = plan.parse_or_ignore(&criteria.job_type);
        plan.experience = plan.parse_or_ignore(&criteria.experience_level);
        plan.sort_key = plan.parse_or_ignore(&criteria.sort_by).unwrap_or_default();
        let explicit_order = plan.parse_or_ignore(&criteria.sort_order);
        plan.sort_order = explicit_order.unwrap_or(plan.sort_key.natural_order());

        for (name, bound) in [("min_salary", plan.min_salary), ("max_salary", plan.max_salary)] {
            if bound.is_some_and(|v| !v.is_finite() || v < 0.0) {
                plan.adjust(format!("{name} must be a non-negative number; ignored"));
            }
        }
        plan.min_salary = plan.min_salary.filter(|v| v.is_finite() && *v >= 0.0);
        plan.max_salary = plan.max_salary.filter(|v| v.is_finite() && *v >= 0.0);

        if let (Some(min), Some(max)) = (plan.min_salary, plan.max_salary) {
            if min > max {
                plan.adjust(format!(
                    "min_salary {min} exceeds max_salary {max}; salary bounds ignored"
                ));
                plan.min_salary = None;
                plan.max_salary = None;
            }
        }
        plan
    }

    /// Parse an optional enumerated field, recording a recovery on failure.
    fn parse_or_ignore<T>(&mut self, raw: &Option<String>) -> Option<T>
    where
        T: std::str::FromStr<Err = String>,
    {
        let value = non_blank(raw)?;
        match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(reason) => {
                self.adjust(format!("{reason}; ignored"));
                None
            }
        }
    }

    fn adjust(&mut self, message: String) {
        log::warn!("Search criteria adjusted: {}", message);
        self.adjustments.push(message);
    }

    fn matches(&self, posting: &JobPosting) -> bool {
        let contains = |field: &str, needle: &Option<String>| {
            needle
                .as_deref()
                .is_none_or(|n| field.to_lowercase().contains(n))
        };

        let text_match = self.q.as_deref().is_none_or(|q| {
            [&posting.title, &posting.company, &posting.description]
                .iter()
                .any(|field| field.to_lowercase().contains(q))
        });

        text_match
            && contains(&posting.company, &self.company)
            && contains(&posting.location, &self.location)
            && contains(&posting.description, &self.technology)
            && self.matches_salary(posting)
            && self
                .job_type
                .is_none_or(|job_type| posting.job_types().contains(&job_type))
            && self
                .experience
                .is_none_or(|level| posting.experience_level() == level)
    }

    fn matches_salary(&self, posting: &JobPosting) -> bool {
        if self.min_salary.is_none() && self.max_salary.is_none() {
            return true;
        }
        posting
            .salary_range()
            .is_some_and(|range| range.overlaps(self.min_salary, self.max_salary))
    }

    fn compare(&self, a: &JobPosting, b: &JobPosting) -> Ordering {
        let primary = match self.sort_key {
            SortKey::ScrapedAt => a.scraped_at.cmp(&b.scraped_at),
            SortKey::Title => compare_text(&a.title, &b.title),
            SortKey::Company => compare_text(&a.company, &b.company),
            SortKey::Location => compare_text(&a.location, &b.location),
        };
        let primary = match self.sort_order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Filter/search engine over cached postings.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    tagger: TechnologyTagger,
    default_page_size: usize,
}

impl SearchEngine {
    pub fn new(tagger: TechnologyTagger, default_page_size: usize) -> Self {
        Self {
            tagger,
            default_page_size: default_page_size.max(1),
        }
    }

    pub fn tagger(&self) -> &TechnologyTagger {
        &self.tagger
    }

    /// Filter `postings` by `criteria`, sort, and return page `page`
    /// (1-indexed) of `page_size` items.
    pub fn search(
        &self,
        postings: &[JobPosting],
        criteria: &FilterCriteria,
        page: usize,
        page_size: usize,
    ) -> SearchResults {
        let mut plan = Plan::from_criteria(criteria);

        let page = if page == 0 {
            plan.adjust("page must be >= 1; using page 1".to_string());
            1
        } else {
            page
        };
        let page_size = if page_size == 0 {
            plan.adjust(format!(
                "page_size must be >= 1; using {}",
                self.default_page_size
            ));
            self.default_page_size
        } else {
            page_size
        };

        let mut matched: Vec<&JobPosting> = postings.iter().filter(|p| plan.matches(p)).collect();
        matched.sort_by(|a, b| plan.compare(a, b));

        let total = matched.len();
        let page_count = total.div_ceil(page_size);
        let items = matched
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .map(|posting| TaggedPosting {
                technologies: self.tagger.tag(posting),
                posting: posting.clone(),
            })
            .collect();

        log::debug!(
            "Search matched {} of {} postings (page {}/{})",
            total,
            postings.len(),
            page,
            page_count
        );

        SearchResults {
            items,
            total,
            page,
            page_count,
            has_next: page < page_count,
            has_prev: page > 1 && page_count > 0,
            adjustments: plan.adjustments,
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(TechnologyTagger::default(), 20)
    }
}
