//! # Flipper Ranking
//!
//! Client side of the Flipper NFT ranking page: polls the scoring service
//! until a wallet's collection job is ready, fetches the ranked payload and
//! serves paged views of it.
//!
//! - [`poller::CollectionPoller`] owns the single live polling loop
//! - [`panel::RankingPanel`] glues poller, payload and view selections
//! - [`scoring::ScoringClient`] is the HTTP implementation of the service

pub mod config;
pub mod error;
pub mod panel;
pub mod poller;
pub mod scoring;
pub mod wallet;

pub use error::{RankingError, Result};
