//! Job posting data structure and the attributes derived from it.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// A job offer as returned by the offers endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobPosting {
    /// Unique, stable identifier
    pub id: i64,

    /// Position title
    pub title: String,

    /// Hiring company (empty when the source did not list one)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub company: String,

    /// Location text (empty when unknown)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: String,

    /// Full description text
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    /// Link to the original offer
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,

    /// When the offer was scraped
    #[serde(with = "timestamp")]
    pub scraped_at: DateTime<Utc>,
}

impl JobPosting {
    /// Experience level implied by the title.
    pub fn experience_level(&self) -> ExperienceLevel {
        ExperienceLevel::classify(&self.title)
    }

    /// Job types mentioned in the title or description.
    pub fn job_types(&self) -> Vec<JobType> {
        let text = normalize_words(&format!("{} {}", self.title, self.description));
        JobType::ALL
            .into_iter()
            .filter(|job_type| {
                job_type
                    .phrases()
                    .iter()
                    .any(|phrase| text.contains(&format!(" {phrase} ")))
            })
            .collect()
    }

    /// Salary range mentioned in the description, if any.
    pub fn salary_range(&self) -> Option<SalaryRange> {
        SalaryRange::extract(&self.description)
    }
}

/// Seniority bucket derived from a posting title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
    Lead,
}

impl ExperienceLevel {
    const LEAD_WORDS: &'static [&'static str] = &["lead", "principal", "head", "architect", "staff"];
    const SENIOR_WORDS: &'static [&'static str] = &["senior", "sr"];
    const JUNIOR_WORDS: &'static [&'static str] =
        &["junior", "jr", "entry", "trainee", "intern", "practicante"];

    /// Classify a title. Lead keywords win over senior, senior over junior;
    /// anything else is mid level.
    pub fn classify(title: &str) -> Self {
        let lowered = title.to_lowercase();
        let words: Vec<&str> = lowered.unicode_words().collect();
        let has_any = |keywords: &[&str]| words.iter().any(|w| keywords.contains(w));

        if has_any(Self::LEAD_WORDS) {
            Self::Lead
        } else if has_any(Self::SENIOR_WORDS) {
            Self::Senior
        } else if has_any(Self::JUNIOR_WORDS) {
            Self::Junior
        } else {
            Self::Mid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Mid => "mid",
            Self::Senior => "senior",
            Self::Lead => "lead",
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "junior" | "jr" | "entry" => Ok(Self::Junior),
            "mid" | "middle" | "intermediate" => Ok(Self::Mid),
            "senior" | "sr" => Ok(Self::Senior),
            "lead" | "principal" => Ok(Self::Lead),
            other => Err(format!("unknown experience level '{other}'")),
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employment arrangement mentioned by a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Remote,
    Internship,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        Self::FullTime,
        Self::PartTime,
        Self::Contract,
        Self::Remote,
        Self::Internship,
    ];

    /// Word sequences (already normalized) that signal this job type.
    fn phrases(&self) -> &'static [&'static str] {
        match self {
            Self::FullTime => &["full time", "tiempo completo"],
            Self::PartTime => &["part time", "medio tiempo"],
            Self::Contract => &["contract", "contractor", "freelance"],
            Self::Remote => &["remote", "remoto", "teletrabajo", "home office"],
            Self::Internship => &["internship", "intern", "pasantía", "pasante"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullTime => "full-time",
            Self::PartTime => "part-time",
            Self::Contract => "contract",
            Self::Remote => "remote",
            Self::Internship => "internship",
        }
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_words(s).trim() {
            "full time" | "fulltime" => Ok(Self::FullTime),
            "part time" | "parttime" => Ok(Self::PartTime),
            "contract" | "freelance" => Ok(Self::Contract),
            "remote" => Ok(Self::Remote),
            "internship" | "intern" => Ok(Self::Internship),
            _ => Err(format!("unknown job type '{}'", s.trim())),
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Salary figures found in a description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

impl SalaryRange {
    /// Extract every currency-marked amount from `text` and span them.
    ///
    /// Recognizes `$`, `€`, `USD`, `COP`, `EUR` and `MXN` markers, thousands
    /// separators (`3.500.000`, `3,500,000`) and a trailing `k`.
    pub fn extract(text: &str) -> Option<Self> {
        let pattern = salary_pattern()?;
        let amounts: Vec<f64> = pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let amount = parse_amount(caps.get(1)?.as_str())?;
                let scale = if caps.get(2).is_some() { 1000.0 } else { 1.0 };
                Some(amount * scale)
            })
            .collect();

        let min = amounts.iter().copied().reduce(f64::min)?;
        let max = amounts.iter().copied().reduce(f64::max)?;
        Some(Self { min, max })
    }

    /// Whether this range overlaps `[lower, upper]` (either bound optional).
    pub fn overlaps(&self, lower: Option<f64>, upper: Option<f64>) -> bool {
        lower.is_none_or(|lo| self.max >= lo) && upper.is_none_or(|hi| self.min <= hi)
    }
}

fn salary_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"(?i)(?:\$|€|\b(?:usd|cop|eur|mxn)\b)\s*(\d{1,3}(?:[.,]\d{3})+|\d+(?:[.,]\d+)?)\s*(k\b)?",
            )
            .ok()
        })
        .as_ref()
}

fn parse_amount(raw: &str) -> Option<f64> {
    let grouped = raw.len() > 4
        && raw
            .split(['.', ','])
            .skip(1)
            .all(|group| group.len() == 3);
    if grouped {
        raw.replace(['.', ','], "").parse().ok()
    } else {
        raw.replace(',', ".").parse().ok()
    }
}

/// Lowercase `text` and rejoin its words with single spaces, padded on both
/// sides so phrases can be matched on word boundaries.
fn normalize_words(text: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.unicode_words().collect();
    format!(" {} ", words.join(" "))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse an API timestamp: RFC 3339, or a naive ISO timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Serde adapter for API timestamps.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(title: &str, description: &str) -> JobPosting {
        JobPosting {
            id: 1,
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Bogotá".to_string(),
            description: description.to_string(),
            url: String::new(),
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_deserialize_backend_offer() {
        let json = r#"{
            "id": 7,
            "title": "Backend Developer",
            "company": null,
            "location": "Medellín",
            "description": "Python and Django",
            "url": "https://example.com/7",
            "scraped_at": "2024-05-02T10:15:30.123456"
        }"#;

        let offer: JobPosting = serde_json::from_str(json).unwrap();
        assert_eq!(offer.id, 7);
        assert_eq!(offer.company, "");
        assert_eq!(offer.scraped_at.to_rfc3339(), "2024-05-02T10:15:30.123456+00:00");
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-05-02T10:15:30Z").is_some());
        assert!(parse_timestamp("2024-05-02T10:15:30").is_some());
        assert!(parse_timestamp("2024-05-02 10:15:30").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_experience_level_classification() {
        assert_eq!(ExperienceLevel::classify("Senior Python Developer"), ExperienceLevel::Senior);
        assert_eq!(ExperienceLevel::classify("Tech Lead - Sr Backend"), ExperienceLevel::Lead);
        assert_eq!(ExperienceLevel::classify("Jr. Frontend Engineer"), ExperienceLevel::Junior);
        assert_eq!(ExperienceLevel::classify("Frontend React Engineer"), ExperienceLevel::Mid);
        // "sr" must be a whole word
        assert_eq!(ExperienceLevel::classify("JSR Specialist"), ExperienceLevel::Mid);
    }

    #[test]
    fn test_job_types() {
        let offer = posting("Data Engineer", "Full-time, 100% remote. Contractors welcome.");
        let types = offer.job_types();
        assert!(types.contains(&JobType::FullTime));
        assert!(types.contains(&JobType::Remote));
        // "contractors" is not the word "contractor"
        assert!(!types.contains(&JobType::Contract));
        assert!(!posting("Intern", "").job_types().is_empty());
        assert!(posting("Engineer", "international team").job_types().is_empty());
    }

    #[test]
    fn test_job_type_from_str() {
        assert_eq!("full-time".parse::<JobType>(), Ok(JobType::FullTime));
        assert_eq!("Part Time".parse::<JobType>(), Ok(JobType::PartTime));
        assert!("gig".parse::<JobType>().is_err());
    }

    #[test]
    fn test_salary_extraction() {
        let range = SalaryRange::extract("Salario entre $3.500.000 y $4.000.000 COP").unwrap();
        assert_eq!(range.min, 3_500_000.0);
        assert_eq!(range.max, 4_000_000.0);

        let range = SalaryRange::extract("Compensation: USD 85k - USD 110k").unwrap();
        assert_eq!(range.min, 85_000.0);
        assert_eq!(range.max, 110_000.0);

        assert!(SalaryRange::extract("Competitive pay, 5 years experience").is_none());
    }

    #[test]
    fn test_salary_overlap() {
        let range = SalaryRange {
            min: 3_000_000.0,
            max: 4_000_000.0,
        };
        assert!(range.overlaps(Some(3_500_000.0), None));
        assert!(range.overlaps(None, Some(3_000_000.0)));
        assert!(!range.overlaps(Some(4_500_000.0), None));
        assert!(!range.overlaps(None, Some(2_000_000.0)));
        assert!(range.overlaps(None, None));
    }
}
