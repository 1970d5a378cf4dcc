// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key management for agent API keys.
//!
//! Keys are stored as `nonce_hex:ciphertext_hex`, sealed with AES-256-GCM
//! under a key derived (Argon2id) from the configured master secret.

pub mod cipher;
pub mod kdf;
pub mod resolver;

pub use cipher::ApiKeyCipher;
pub use resolver::StoredKeyResolver;
