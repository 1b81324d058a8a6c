use crate::types::CredentialId;
use sha2::{Digest, Sha256};

/// Derive a credential ID from its signable content.
///
/// Formula: Base58(SHA-256(content)[0:20])
///
/// The ID commits to the credential's public form, so any mutation of the
/// public fields produces a different ID.
pub fn credential_id_for(content: &[u8]) -> CredentialId {
    let hash = Sha256::digest(content);
    CredentialId(bs58::encode(&hash[..20]).into_string())
}

/// Check that a declared credential ID matches the given signable content.
pub fn verify_credential_id(id: &CredentialId, content: &[u8]) -> bool {
    credential_id_for(content) == *id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_deterministic() {
        let id1 = credential_id_for(b"credential body");
        let id2 = credential_id_for(b"credential body");
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_id_content_sensitive() {
        let id1 = credential_id_for(b"credential body");
        let id2 = credential_id_for(b"credential bodY");
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_is_base58() {
        let id = credential_id_for(b"anything");
        assert!(id.as_str().chars().all(|c| {
            matches!(c, '1'..='9' | 'A'..='H' | 'J'..='N' | 'P'..='Z' | 'a'..='k' | 'm'..='z')
        }));
    }

    #[test]
    fn test_verify_credential_id() {
        let id = credential_id_for(b"some form");
        assert!(verify_credential_id(&id, b"some form"));
        assert!(!verify_credential_id(&id, b"other form"));
    }
}
