// src/services/tagger.rs

//! Technology tagging by keyword containment.
//!
//! Matching is case-insensitive substring containment, so short terms such as
//! `Go` or `API` also match inside longer words. Results follow vocabulary
//! order and never repeat a term.

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::models::{JobPosting, TaggerConfig, TechnologyStat};

/// Extracts known technology labels from free text.
#[derive(Debug, Clone)]
pub struct TechnologyTagger {
    /// (label, lowercased label)
    vocabulary: Vec<(String, String)>,
}

impl TechnologyTagger {
    /// Build a tagger. Blank terms and case-insensitive duplicates are
    /// dropped; the first spelling wins.
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let vocabulary = vocabulary
            .into_iter()
            .map(Into::into)
            .filter_map(|term| {
                let label = term.trim().to_string();
                let needle = label.to_lowercase();
                (!label.is_empty() && seen.insert(needle.clone())).then_some((label, needle))
            })
            .collect();
        Self { vocabulary }
    }

    pub fn from_config(config: &TaggerConfig) -> Self {
        Self::new(config.technologies.iter().cloned())
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.iter().map(|(label, _)| label.as_str())
    }

    /// Vocabulary terms contained in `text`, in vocabulary order.
    pub fn extract(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let haystack = text.to_lowercase();
        self.vocabulary
            .iter()
            .filter(|(_, needle)| haystack.contains(needle.as_str()))
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Tags for a posting, taken from its description.
    pub fn tag(&self, posting: &JobPosting) -> Vec<String> {
        self.extract(&posting.description)
    }

    /// Number of postings mentioning each technology, with its share of all
    /// postings. Technologies nobody mentions are omitted; ties keep
    /// vocabulary order.
    pub fn demand(&self, postings: &[JobPosting]) -> Vec<TechnologyStat> {
        if postings.is_empty() {
            return Vec::new();
        }

        let mut counts = vec![0u64; self.vocabulary.len()];
        for posting in postings {
            let haystack = posting.description.to_lowercase();
            for (count, (_, needle)) in counts.iter_mut().zip(&self.vocabulary) {
                if haystack.contains(needle.as_str()) {
                    *count += 1;
                }
            }
        }

        let total = postings.len() as f64;
        let mut stats: Vec<TechnologyStat> = self
            .vocabulary
            .iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|((label, _), count)| TechnologyStat {
                technology: label.clone(),
                count,
                percentage: (count as f64 / total * 1000.0).round() / 10.0,
            })
            .collect();
        stats.sort_by(|a, b| b.count.cmp(&a.count));
        stats
    }
}

impl Default for TechnologyTagger {
    fn default() -> Self {
        Self::from_config(&TaggerConfig::default())
    }
}

/// Extract technologies from `text` with the default vocabulary.
pub fn extract_technologies(text: &str) -> Vec<String> {
    static DEFAULT: OnceLock<TechnologyTagger> = OnceLock::new();
    DEFAULT.get_or_init(TechnologyTagger::default).extract(text)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn posting(id: i64, description: &str) -> JobPosting {
        JobPosting {
            id,
            title: "Developer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            description: description.to_string(),
            url: String::new(),
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_extract_in_vocabulary_order() {
        let tags = extract_technologies("We use react, PYTHON and docker daily");
        assert_eq!(tags, vec!["Python", "React", "Docker"]);
    }

    #[test]
    fn test_extract_matches_inside_words() {
        let tags = extract_technologies("Experience with Golang and RESTful APIs");
        assert!(tags.contains(&"Go".to_string()));
        assert!(tags.contains(&"REST".to_string()));
        assert!(tags.contains(&"API".to_string()));
    }

    #[test]
    fn test_extract_is_subset_without_duplicates() {
        let tagger = TechnologyTagger::default();
        let vocabulary: Vec<&str> = tagger.vocabulary().collect();
        let text = "Java java JavaScript TypeScript Node.js node.js AWS Azure";
        let tags = tagger.extract(text);

        assert!(tags.iter().all(|t| vocabulary.contains(&t.as_str())));
        let unique: HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
        assert_eq!(tagger.extract(text), tags);
    }

    #[test]
    fn test_extract_empty_text() {
        assert!(extract_technologies("").is_empty());
        assert!(extract_technologies("Nothing technical here").is_empty());
    }

    #[test]
    fn test_custom_vocabulary_dedupes() {
        let tagger = TechnologyTagger::new(["Rust", "rust", "  ", "Tokio"]);
        assert_eq!(tagger.vocabulary().collect::<Vec<_>>(), vec!["Rust", "Tokio"]);
        assert_eq!(tagger.extract("async RUST with tokio"), vec!["Rust", "Tokio"]);
    }

    #[test]
    fn test_demand_counts_postings() {
        let tagger = TechnologyTagger::new(["Rust", "Python", "Docker", "Kotlin"]);
        let postings = vec![
            posting(1, "Rust and Docker"),
            posting(2, "Python, Docker"),
            posting(3, "rust rust rust"),
            posting(4, "Docker only"),
        ];

        let stats = tagger.demand(&postings);
        let summary: Vec<(&str, u64, f64)> = stats
            .iter()
            .map(|s| (s.technology.as_str(), s.count, s.percentage))
            .collect();
        assert_eq!(
            summary,
            vec![("Docker", 3, 75.0), ("Rust", 2, 50.0), ("Python", 1, 25.0)]
        );
    }

    #[test]
    fn test_demand_of_nothing() {
        assert!(TechnologyTagger::default().demand(&[]).is_empty());
    }
}
