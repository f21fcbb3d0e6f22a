// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API key generation and hashing.
//!
//! Keys look like `nx-<43 base64url chars>` (32 random bytes). Only the
//! SHA-256 digest and the first [`PREFIX_LEN`] characters are persisted; the
//! plaintext is shown once at creation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

pub const KEY_SCHEME: &str = "nx-";

/// Characters of the plaintext key kept for display.
pub const PREFIX_LEN: usize = 8;

const KEY_BYTES: usize = 32;

/// Generates a fresh API key from the OS random source.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format!("{KEY_SCHEME}{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Hex SHA-256 digest under which a key is stored.
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Display prefix of a key, e.g. `nx-AbC12`.
pub fn key_prefix(key: &str) -> String {
    key.chars().take(PREFIX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_have_scheme_and_length() {
        let key = generate_api_key();
        assert!(key.starts_with(KEY_SCHEME));
        assert_eq!(key.len(), KEY_SCHEME.len() + 43);
        assert!(
            key[KEY_SCHEME.len()..]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn generated_keys_are_unique() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = hash_api_key("nx-test");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_api_key("nx-test"));
        assert_ne!(h, hash_api_key("nx-tesT"));
    }

    #[test]
    fn prefix_is_first_chars() {
        assert_eq!(key_prefix("nx-abcdefghij"), "nx-abcde");
        assert_eq!(key_prefix("nx-a"), "nx-a");
    }
}
