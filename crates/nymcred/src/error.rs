use nymcred_core::{CoreError, CredentialId, CredentialRole, KeyUsage, SignatureRole};
use thiserror::Error;

/// Error taxonomy for the credential engine.
///
/// Display strings never include secret material: passphrases, unsealed key
/// bytes, and plaintext never reach an error message. Offending credential
/// IDs are public and are carried where they help diagnosis.
#[derive(Debug, Error)]
pub enum CredError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("role mismatch: expected {expected}, found {found}")]
    RoleMismatch {
        expected: CredentialRole,
        found: CredentialRole,
    },

    #[error("credential not found in storage: {0}")]
    NotFound(CredentialId),

    #[error("no active child credential can sign")]
    NoSigningKeyAvailable,

    #[error("no usable {0} key in this credential set")]
    NoUsableKey(KeyUsage),

    #[error("master credentials may only sign other credentials")]
    MasterCannotSignPayload,

    #[error("signature role {0} can not be produced by a credential set")]
    UnsupportedSignatureRole(SignatureRole),

    #[error("no private material on the master credential")]
    NoPrivateMaterial,

    #[error("validation failed for credential {0}")]
    Validation(CredentialId),

    #[error("crypto failure: {0}")]
    Crypto(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("serialization failure: {0}")]
    Serialization(String),
}

impl From<CoreError> for CredError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Storage(msg) => CredError::Storage(msg),
            CoreError::Crypto(msg) => CredError::Crypto(msg),
            CoreError::Serialization(msg) => CredError::Serialization(msg),
            CoreError::Internal(msg) => CredError::Crypto(msg),
        }
    }
}

pub type CredResult<T> = Result<T, CredError>;
