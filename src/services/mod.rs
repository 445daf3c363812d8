//! Service layer for the market data client.
//!
//! This module contains:
//! - Typed API bindings (`MarketApi`)
//! - Technology tagging (`TechnologyTagger`)
//! - Client-side search (`SearchEngine`)
//! - The cached data facade (`MarketData`)

mod api;
pub mod market;
mod search;
mod tagger;

pub use api::MarketApi;
pub use market::{MarketData, QueryView};
pub use search::{SearchEngine, SearchResults, TaggedPosting};
pub use tagger::{TechnologyTagger, extract_technologies};
