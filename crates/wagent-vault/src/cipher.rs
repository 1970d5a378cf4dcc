// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM sealing of API keys.

use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use wagent_config::model::VaultConfig;
use wagent_core::WagentError;

use crate::kdf::derive_key;

/// Seals and opens stored API keys.
pub struct ApiKeyCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl std::fmt::Debug for ApiKeyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyCipher").finish_non_exhaustive()
    }
}

impl ApiKeyCipher {
    pub fn from_key(key: &[u8; 32]) -> Result<Self, WagentError> {
        let unbound = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| WagentError::Vault("failed to create AES-256-GCM key".into()))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Derives the cipher key from `vault.master_key`.
    pub fn from_config(config: &VaultConfig) -> Result<Self, WagentError> {
        let master = config.master_key.as_deref().ok_or_else(|| {
            WagentError::Config(
                "vault.master_key is not set (export WAGENT_VAULT_MASTER_KEY)".into(),
            )
        })?;
        let salt = hex::decode(&config.salt)
            .map_err(|e| WagentError::Config(format!("vault.salt is not hex: {e}")))?;
        let key = derive_key(
            master.as_bytes(),
            &salt,
            config.kdf_memory_cost,
            config.kdf_iterations,
            config.kdf_parallelism,
        )?;
        Self::from_key(&key)
    }

    /// Returns the stored form `nonce_hex:ciphertext_hex`.
    pub fn encrypt(&self, plaintext: &SecretString) -> Result<String, WagentError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| WagentError::Vault("failed to generate nonce".into()))?;

        let mut in_out = plaintext.expose_secret().as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| WagentError::Vault("encryption failed".into()))?;
        Ok(format!("{}:{}", hex::encode(nonce_bytes), hex::encode(in_out)))
    }

    pub fn decrypt(&self, stored: &str) -> Result<SecretString, WagentError> {
        let (nonce_hex, body_hex) = stored
            .split_once(':')
            .ok_or_else(|| WagentError::Vault("stored key is not `nonce:ciphertext`".into()))?;
        let nonce: [u8; NONCE_LEN] = hex::decode(nonce_hex)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| WagentError::Vault("stored key has a malformed nonce".into()))?;
        let mut in_out = hex::decode(body_hex)
            .map_err(|_| WagentError::Vault("stored key has a malformed ciphertext".into()))?;

        let plaintext = self
            .key
            .open_in_place(Nonce::assume_unique_for_key(nonce), Aad::empty(), &mut in_out)
            .map_err(|_| {
                WagentError::Vault("decryption failed, wrong master key or corrupted data".into())
            })?;
        let text = String::from_utf8(plaintext.to_vec())
            .map_err(|_| WagentError::Vault("decrypted key is not UTF-8".into()))?;
        Ok(SecretString::from(text))
    }
}
