use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Credential hashing used by the account service
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;

    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Salted SHA-256, stored as `<salt hex>$<digest hex>`
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedSha256;

impl SaltedSha256 {
    fn digest(salt: &[u8], password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl PasswordHasher for SaltedSha256 {
    fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        format!("{}${}", hex::encode(salt), Self::digest(&salt, password))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let Some((salt_hex, expected)) = stored.split_once('$') else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        let actual = Self::digest(&salt, password);
        bool::from(actual.as_bytes().ct_eq(expected.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies() {
        let hasher = SaltedSha256;
        let stored = hasher.hash("hunter2");
        assert!(hasher.verify("hunter2", &stored));
        assert!(!hasher.verify("hunter3", &stored));
    }

    #[test]
    fn test_salt_differs_per_hash() {
        let hasher = SaltedSha256;
        assert_ne!(hasher.hash("same"), hasher.hash("same"));
    }

    #[test]
    fn test_stored_value_is_hex_encoded() {
        let stored = SaltedSha256.hash("hunter2");
        let (salt, digest) = stored.split_once('$').unwrap();
        assert_eq!(hex::decode(salt).unwrap().len(), 16);
        assert_eq!(hex::decode(digest).unwrap().len(), 32);
    }

    #[test]
    fn test_malformed_stored_value() {
        let hasher = SaltedSha256;
        assert!(!hasher.verify("pw", "no-separator"));
        assert!(!hasher.verify("pw", "zz$abcd"));
        assert!(!hasher.verify("pw", "abc$abcd"));
    }
}
