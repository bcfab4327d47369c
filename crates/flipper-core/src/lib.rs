//! # Flipper Core
//!
//! Data models and view derivation for the Flipper NFT ranking client.
//!
//! This crate holds everything that does not touch the network: the scoring
//! service wire records, the ranked item model, the session value object and
//! the pure pagination/sort/filter derivation that turns a raw ranked
//! collection into the page a user is looking at.

pub mod error;
pub mod models;
pub mod session;
pub mod view;

pub use error::*;
pub use models::*;
pub use session::*;
pub use view::*;
