use sha2::{Digest, Sha256};

/// Compute SHA-256 of an in-memory byte slice.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode a raw 32-byte hash as a lowercase hex string (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Content digest used as a statement's identity.
pub fn statement_digest(pdf: &[u8]) -> String {
    to_hex(&sha256_bytes(pdf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest_of_empty_input() {
        assert_eq!(
            statement_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = statement_digest(b"%PDF-1.7 statement A");
        assert_eq!(a, statement_digest(b"%PDF-1.7 statement A"));
        assert_ne!(a, statement_digest(b"%PDF-1.7 statement B"));
        assert_eq!(a.len(), 64);
    }
}
