//! Data models shared by the scoring client and the view derivation
//!
//! The status records mirror the scoring service's JSON bodies. Ranked items
//! mirror the payload records served from the job's data url.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Scoring Service Status
// =============================================================================

/// Identifies a scoring job: one wallet asking for one contract's rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequest {
    pub wallet_address: String,
    pub signature: String,
    pub contract_address: String,
    /// Ask the service to rescore even when a cached result exists
    pub force: bool,
}

/// Job state reported by the scoring service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Ready,
    Error,
    /// Anything the service reports that is neither ready nor error is
    /// treated as still in progress.
    #[default]
    #[serde(other)]
    Pending,
}

/// Status endpoint response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatus {
    #[serde(default)]
    pub status: JobStatus,

    #[serde(default)]
    pub status_code: Option<u16>,

    /// Where the ranked payload can be fetched (set once ready)
    #[serde(default)]
    pub data_url: Option<String>,

    /// Failure detail (set on error)
    #[serde(default)]
    pub message: Option<String>,
}

impl CollectionStatus {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn ready(data_url: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Ready,
            status_code: Some(200),
            data_url: Some(data_url.into()),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            status_code: Some(200),
            data_url: None,
            message: Some(message.into()),
        }
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Not-found and server-error answers, and explicit job errors, mean the
    /// wallet has nothing the service can rank.
    pub fn is_no_data(&self) -> bool {
        matches!(self.status_code, Some(404) | Some(500)) || self.status == JobStatus::Error
    }

    pub fn is_ready(&self) -> bool {
        self.status == JobStatus::Ready
    }
}

/// Progress of a collection as seen by whoever started it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CollectionEvent {
    /// The wallet has no data to rank; the user should retry or rescrape
    NoData { reason: String },
    /// The job is still running and is being polled
    Pending,
    /// The payload can be fetched from `data_url`
    DataReady { data_url: String },
    /// The job failed after being accepted
    Failed { message: String },
}

impl CollectionEvent {
    /// Whether no further events follow this one
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CollectionEvent::Pending)
    }
}

// =============================================================================
// Ranked Items
// =============================================================================

/// Per-trait contribution to an item's rarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitScore {
    pub name: String,
    pub score: f64,
}

/// A single NFT's ranking record as served in the job payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    #[serde(deserialize_with = "string_or_number")]
    pub token_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub image_url: String,

    /// Rarity score (higher = rarer)
    pub score: f64,

    /// 1-based rank within the collection
    pub rank: u32,

    #[serde(default)]
    pub traits: Vec<TraitScore>,
}

/// A fetched payload for one contract. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCollection {
    pub contract_address: String,
    pub items: Vec<RankedItem>,
    pub fetched_at: DateTime<Utc>,
}

impl RankedCollection {
    pub fn new(contract_address: impl Into<String>, items: Vec<RankedItem>) -> Self {
        Self {
            contract_address: contract_address.into(),
            items,
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Token ids are strings, but some collections serve them as bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}
