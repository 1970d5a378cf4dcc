// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id derivation of the key-encryption key.

use wagent_core::WagentError;
use zeroize::Zeroizing;

/// Derives 32 bytes from `secret` with Argon2id v0x13.
pub fn derive_key(
    secret: &[u8],
    salt: &[u8],
    memory_cost: u32,
    iterations: u32,
    parallelism: u32,
) -> Result<Zeroizing<[u8; 32]>, WagentError> {
    let params = argon2::Params::new(memory_cost, iterations, parallelism, Some(32))
        .map_err(|e| WagentError::Vault(format!("invalid Argon2id parameters: {e}")))?;
    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(secret, salt, output.as_mut())
        .map_err(|e| WagentError::Vault(format!("key derivation failed: {e}")))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_depends_on_salt() {
        let a = derive_key(b"master", &[1u8; 16], 32768, 2, 1).unwrap();
        let b = derive_key(b"master", &[1u8; 16], 32768, 2, 1).unwrap();
        let c = derive_key(b"master", &[2u8; 16], 32768, 2, 1).unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(derive_key(b"master", &[1u8; 16], 1, 0, 0).is_err());
    }
}
