//! Wallet provider and session credential seams
//!
//! A collection start asks the wallet provider for its accounts once and
//! reads the ownership signature from the session credential store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use flipper_core::SessionState;

use crate::error::{validate_contract_address, validate_wallet_address, RankingError, Result};

/// Key under which the wallet ownership signature is stored
pub const SIGNATURE_KEY: &str = "signature";

/// A connected wallet extension
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Addresses the user has authorised, primary account first
    async fn request_accounts(&self) -> Result<Vec<String>>;
}

/// Wallet with a fixed account list (headless runs, tests)
#[derive(Debug, Clone, Default)]
pub struct StaticWallet {
    accounts: Vec<String>,
}

impl StaticWallet {
    pub fn new(accounts: Vec<String>) -> Self {
        Self { accounts }
    }

    pub fn single(address: impl Into<String>) -> Self {
        Self::new(vec![address.into()])
    }
}

#[async_trait]
impl WalletProvider for StaticWallet {
    async fn request_accounts(&self) -> Result<Vec<String>> {
        Ok(self.accounts.clone())
    }
}

/// Session-scoped key-value store
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signature(signature: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(SIGNATURE_KEY, signature.into());
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

/// Resolve the session for a collection start.
pub async fn connect_session(
    wallet: &dyn WalletProvider,
    credentials: &dyn CredentialStore,
    contract_address: &str,
) -> Result<SessionState> {
    validate_contract_address(contract_address)?;

    let accounts = wallet.request_accounts().await?;
    let wallet_address = accounts
        .into_iter()
        .next()
        .ok_or_else(|| RankingError::Wallet("Wallet returned no accounts".into()))?;
    validate_wallet_address(&wallet_address)?;

    let signature = credentials
        .get(SIGNATURE_KEY)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RankingError::MissingCredential(SIGNATURE_KEY.into()))?;

    tracing::debug!(wallet = %wallet_address, contract = %contract_address, "Session connected");

    Ok(SessionState::new(wallet_address, signature, contract_address))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d";
    const WALLET: &str = "0x1234567890abcdef1234567890abcdef12345678";

    #[tokio::test]
    async fn test_connect_uses_first_account() {
        let wallet = StaticWallet::new(vec![WALLET.to_string(), "0xother".to_string()]);
        let store = MemoryCredentialStore::with_signature("sig-1");

        let session = connect_session(&wallet, &store, CONTRACT).await.unwrap();
        assert_eq!(session.wallet_address, WALLET);
        assert_eq!(session.signature, "sig-1");
        assert_eq!(session.contract_address, CONTRACT);
    }

    #[tokio::test]
    async fn test_connect_requires_account_and_signature() {
        let store = MemoryCredentialStore::with_signature("sig-1");
        let err = connect_session(&StaticWallet::default(), &store, CONTRACT)
            .await
            .unwrap_err();
        assert!(matches!(err, RankingError::Wallet(_)));

        let empty = MemoryCredentialStore::new();
        let err = connect_session(&StaticWallet::single(WALLET), &empty, CONTRACT)
            .await
            .unwrap_err();
        assert!(matches!(err, RankingError::MissingCredential(_)));

        let err = connect_session(&StaticWallet::single(WALLET), &store, "0x12")
            .await
            .unwrap_err();
        assert!(matches!(err, RankingError::InvalidParameter(_)));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get(SIGNATURE_KEY), None);
        store.set(SIGNATURE_KEY, "abc".into());
        assert_eq!(store.get(SIGNATURE_KEY).as_deref(), Some("abc"));
        store.remove(SIGNATURE_KEY);
        assert_eq!(store.get(SIGNATURE_KEY), None);
    }
}
