// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::debug;
use wagent_core::{KeyResolver, Store, WagentError};

use crate::cipher::ApiKeyCipher;

/// Looks up an agent's encrypted key in the store and decrypts it.
pub struct StoredKeyResolver {
    store: Arc<dyn Store>,
    cipher: ApiKeyCipher,
    key_name: String,
}

impl StoredKeyResolver {
    pub fn new(store: Arc<dyn Store>, cipher: ApiKeyCipher, key_name: impl Into<String>) -> Self {
        Self {
            store,
            cipher,
            key_name: key_name.into(),
        }
    }
}

#[async_trait]
impl KeyResolver for StoredKeyResolver {
    async fn api_key(&self, agent_id: &str) -> Result<SecretString, WagentError> {
        let stored = self
            .store
            .api_key(agent_id, &self.key_name)
            .await?
            .ok_or_else(|| {
                WagentError::Config(format!(
                    "agent {agent_id} has no {} key configured",
                    self.key_name
                ))
            })?;
        debug!(agent_id, key = %self.key_name, "resolved api key");
        self.cipher.decrypt(&stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use wagent_storage::SqliteStore;

    #[tokio::test]
    async fn resolves_and_decrypts() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.create_agent("a1", "Sales", "asst_1").await.unwrap();
        let cipher = ApiKeyCipher::from_key(&[3u8; 32]).unwrap();
        let stored = cipher
            .encrypt(&SecretString::from("sk-live".to_string()))
            .unwrap();
        store.set_api_key("a1", "OPENAIAPIKEY", &stored).await.unwrap();

        let resolver = StoredKeyResolver::new(
            Arc::new(store),
            ApiKeyCipher::from_key(&[3u8; 32]).unwrap(),
            "OPENAIAPIKEY",
        );
        assert_eq!(resolver.api_key("a1").await.unwrap().expose_secret(), "sk-live");
        assert!(matches!(
            resolver.api_key("a2").await.unwrap_err(),
            WagentError::Config(_)
        ));
    }
}
