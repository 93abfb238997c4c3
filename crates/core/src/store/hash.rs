//! Storage key derivation for request identities.

use sha2::{Digest, Sha256};

use crate::RequestIdentity;

/// Compute the storage key for a request identity.
///
/// The URL is hashed exactly as given; no normalization happens here.
pub fn identity_key(identity: &RequestIdentity) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.method().as_bytes());
    hasher.update(b"\n");
    hasher.update(identity.url().as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(method: &str, url: &str) -> RequestIdentity {
        RequestIdentity::parse(method, url).unwrap()
    }

    #[test]
    fn test_key_stability() {
        let a = identity_key(&id("GET", "https://example.com/a"));
        let b = identity_key(&id("GET", "https://example.com/a"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_differs_by_method() {
        assert_ne!(
            identity_key(&id("GET", "https://example.com/a")),
            identity_key(&id("HEAD", "https://example.com/a"))
        );
    }

    #[test]
    fn test_key_differs_by_query() {
        assert_ne!(
            identity_key(&id("GET", "https://example.com/a?v=1")),
            identity_key(&id("GET", "https://example.com/a?v=2"))
        );
    }

    #[test]
    fn test_key_format() {
        let key = identity_key(&id("GET", "https://example.com"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
