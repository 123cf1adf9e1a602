//! Opaque refresh tokens
//!
//! Clients receive the raw token; only its SHA-256 digest is ever stored.

use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// 32 random bytes, hex encoded (64 chars).
pub fn generate() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

pub fn hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_random_hex() {
        let a = generate();
        let b = generate();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_stable_sha256() {
        assert_eq!(
            hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash("token"), hash("token"));
        assert_ne!(hash("token"), hash("token2"));
    }
}
