//! Visitor fingerprint derivation.
//!
//! The fingerprint is a SHA-256 over the client IP and user agent, used
//! only to distinguish unique from repeat clicks in analytics. It is
//! deterministic: the same (ip, user_agent) pair always hashes to the same
//! value, and missing components fold in as empty strings.

use sha2::{Digest, Sha256};

/// Derive the visitor fingerprint for a click.
pub fn visitor_fingerprint(ip_address: Option<&str>, user_agent: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip_address.unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(user_agent.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = visitor_fingerprint(Some("203.0.113.7"), Some("Mozilla/5.0"));
        let b = visitor_fingerprint(Some("203.0.113.7"), Some("Mozilla/5.0"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_hex_sha256_shape() {
        let fp = visitor_fingerprint(Some("203.0.113.7"), None);
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_varies_by_component() {
        let base = visitor_fingerprint(Some("203.0.113.7"), Some("Mozilla/5.0"));
        assert_ne!(base, visitor_fingerprint(Some("203.0.113.8"), Some("Mozilla/5.0")));
        assert_ne!(base, visitor_fingerprint(Some("203.0.113.7"), Some("curl/8.0")));
        assert_ne!(base, visitor_fingerprint(None, Some("Mozilla/5.0")));
    }

    #[test]
    fn test_fingerprint_missing_components_still_hash() {
        let fp = visitor_fingerprint(None, None);
        assert_eq!(fp.len(), 64);
    }
}
