use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

// ---------------------------------------------------------------------------
// NymId — identifier of the owning identity
// ---------------------------------------------------------------------------

/// Identifier of the identity ("Nym") that owns a credential set.
/// Derived from the identity's source descriptor, not chosen freely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NymId(pub String);

impl NymId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NymId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NymId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// CredentialId — content-derived credential identifier
// ---------------------------------------------------------------------------

/// Content-derived identifier of a single credential:
/// `Base58(SHA-256(public signable form)[0:20])`. See [`crate::crypto`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CredentialId(pub String);

impl CredentialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CredentialId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// CredentialRole — closed role tag
//
// Replaces downcast-based role dispatch: every credential carries exactly
// one of these, and callers match instead of casting.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialRole {
    /// Root key bundle. Self-signs and authorizes child credentials.
    Master,
    /// Subordinate key bundle used for ordinary signing operations.
    ChildKey,
    /// Contact-data credential (no keys).
    Contact,
    /// Verification-claim credential (no keys).
    Verify,
}

impl fmt::Display for CredentialRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialRole::Master => write!(f, "master"),
            CredentialRole::ChildKey => write!(f, "child_key"),
            CredentialRole::Contact => write!(f, "contact"),
            CredentialRole::Verify => write!(f, "verify"),
        }
    }
}

// ---------------------------------------------------------------------------
// KeyUsage — which of the three keypairs an operation wants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyUsage {
    Authentication,
    Encryption,
    Signing,
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyUsage::Authentication => write!(f, "authentication"),
            KeyUsage::Encryption => write!(f, "encryption"),
            KeyUsage::Signing => write!(f, "signing"),
        }
    }
}

// ---------------------------------------------------------------------------
// SignatureRole — what a signature asserts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureRole {
    /// Signature over a credential's public form (self-signature or
    /// master enrollment). The only role a master signs directly.
    PublicCredential,
    /// Signature over a credential's private form, including sealed key
    /// material. Released and re-made whenever the seal changes.
    PrivateCredential,
    /// Signature by the identity source itself. Never produced at the
    /// credential-set level.
    NymIdSource,
    /// Signature over a verification claim.
    Claim,
    /// Ordinary application payload signature.
    Generic,
}

impl fmt::Display for SignatureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureRole::PublicCredential => write!(f, "public_credential"),
            SignatureRole::PrivateCredential => write!(f, "private_credential"),
            SignatureRole::NymIdSource => write!(f, "nym_id_source"),
            SignatureRole::Claim => write!(f, "claim"),
            SignatureRole::Generic => write!(f, "generic"),
        }
    }
}

// ---------------------------------------------------------------------------
// Passphrase — scoped secret input
//
// Always passed as an explicit parameter to the call that needs it; never
// stored on a credential set.
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passphrase(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_ids_distinct() {
        let nym = NymId::new("alice");
        let cred = CredentialId::new("3J98t1WpEZ73");
        assert_ne!(nym.as_str(), cred.as_str());
    }

    #[test]
    fn test_credential_id_ordering() {
        let a = CredentialId::new("aaa");
        let b = CredentialId::new("bbb");
        assert!(a < b);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(CredentialRole::Master.to_string(), "master");
        assert_eq!(CredentialRole::ChildKey.to_string(), "child_key");
    }

    #[test]
    fn test_key_usage_display() {
        assert_eq!(KeyUsage::Signing.to_string(), "signing");
        assert_eq!(KeyUsage::Encryption.to_string(), "encryption");
    }

    #[test]
    fn test_signature_role_serde() {
        let json = serde_json::to_string(&SignatureRole::PublicCredential).unwrap();
        let back: SignatureRole = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SignatureRole::PublicCredential);
    }

    #[test]
    fn test_passphrase_debug_redacted() {
        let p = Passphrase::new("hunter2");
        let s = format!("{:?}", p);
        assert!(!s.contains("hunter2"));
    }
}
