//! Filter criteria accepted by the search engine and the search endpoint.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Structured predicate set over job postings.
///
/// Every field is optional; `None` (or a blank string) means no constraint.
/// Enumerated fields are kept as raw strings so malformed input can be
/// recovered from at search time instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Free-text term matched against title, company and description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Technology mentioned in the description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_salary: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_salary: Option<f64>,

    /// full-time, part-time, contract, remote or internship
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,

    /// junior, mid, senior or lead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,

    /// scraped_at, title, company or location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    /// asc or desc
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

impl FilterCriteria {
    /// Criteria with only a free-text term.
    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }

    /// Whether no field constrains the result.
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Non-blank fields as `(name, value)` pairs, in declaration order.
    ///
    /// Used for the search endpoint's query string and for cache keys.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let strings = [
            ("q", &self.q),
            ("company", &self.company),
            ("location", &self.location),
            ("technology", &self.technology),
        ];
        let enums = [
            ("job_type", &self.job_type),
            ("experience_level", &self.experience_level),
            ("sort_by", &self.sort_by),
            ("sort_order", &self.sort_order),
        ];

        let mut pairs: Vec<(&'static str, String)> = strings
            .into_iter()
            .filter_map(|(name, value)| non_blank(value).map(|v| (name, v.to_string())))
            .collect();

        if let Some(min) = self.min_salary {
            pairs.push(("min_salary", min.to_string()));
        }
        if let Some(max) = self.max_salary {
            pairs.push(("max_salary", max.to_string()));
        }

        pairs.extend(
            enums
                .into_iter()
                .filter_map(|(name, value)| non_blank(value).map(|v| (name, v.to_string()))),
        );
        pairs
    }
}

/// Trimmed value of an optional string, `None` when blank.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Field a search result is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Recency
    #[default]
    ScrapedAt,
    Title,
    Company,
    Location,
}

impl SortKey {
    /// Direction used when no explicit order is given.
    pub fn natural_order(&self) -> SortOrder {
        match self {
            Self::ScrapedAt => SortOrder::Desc,
            Self::Title | Self::Company | Self::Location => SortOrder::Asc,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scraped_at" | "scrapedat" | "date" | "recency" => Ok(Self::ScrapedAt),
            "title" => Ok(Self::Title),
            "company" => Ok(Self::Company),
            "location" => Ok(Self::Location),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ScrapedAt => "scraped_at",
            Self::Title => "title",
            Self::Company => "company",
            Self::Location => "location",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_criteria() {
        assert!(FilterCriteria::default().is_empty());
        let blank = FilterCriteria {
            q: Some("   ".to_string()),
            company: Some(String::new()),
            ..FilterCriteria::default()
        };
        assert!(blank.is_empty());
    }

    #[test]
    fn test_query_pairs_skip_blank_fields() {
        let criteria = FilterCriteria {
            q: Some(" react ".to_string()),
            location: Some(String::new()),
            min_salary: Some(3000.0),
            sort_by: Some("title".to_string()),
            ..FilterCriteria::default()
        };

        assert_eq!(
            criteria.query_pairs(),
            vec![
                ("q", "react".to_string()),
                ("min_salary", "3000".to_string()),
                ("sort_by", "title".to_string()),
            ]
        );
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("scraped_at".parse::<SortKey>(), Ok(SortKey::ScrapedAt));
        assert_eq!("Company".parse::<SortKey>(), Ok(SortKey::Company));
        assert!("salary".parse::<SortKey>().is_err());
        assert_eq!(SortKey::Title.natural_order(), SortOrder::Asc);
        assert_eq!(SortKey::default().natural_order(), SortOrder::Desc);
    }
}
