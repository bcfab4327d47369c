//! Session value object
//!
//! Carries the wallet, credential and contract a collection is requested for.
//! It is passed explicitly into the poller instead of living in shared state.

use serde::{Deserialize, Serialize};

use crate::models::CollectionRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Connected wallet address (first account reported by the provider)
    pub wallet_address: String,

    /// Signature proving wallet ownership to the scoring service
    pub signature: String,

    /// NFT contract whose collection is being ranked
    pub contract_address: String,
}

impl SessionState {
    pub fn new(
        wallet_address: impl Into<String>,
        signature: impl Into<String>,
        contract_address: impl Into<String>,
    ) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            signature: signature.into(),
            contract_address: contract_address.into(),
        }
    }

    /// Status request for this session. Polling never forces a rescore.
    pub fn collection_request(&self) -> CollectionRequest {
        CollectionRequest {
            wallet_address: self.wallet_address.clone(),
            signature: self.signature.clone(),
            contract_address: self.contract_address.clone(),
            force: false,
        }
    }
}
