// src/lib.rs

//! Market Lens: client-side data layer for the job market analyzer API.
//!
//! Reads go through a keyed [`cache::QueryCache`] with staleness and retry
//! policy, writes go through a [`mutation::MutationCoordinator`] that
//! invalidates dependent queries, and offer lists are filtered, sorted and
//! tagged locally by [`services::SearchEngine`].

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod mutation;
pub mod pipeline;
pub mod services;
pub mod transport;
pub mod utils;
