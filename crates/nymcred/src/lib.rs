//! Nym Credential Engine
//!
//! Credential-set lifecycle for a nym: one self-signed master credential
//! anchors a set of child credentials (key, contact, verification), each
//! enrollment-signed by the master. The set is the unit of trust:
//! validation walks the chain, payload signing and verification are
//! delegated to children, and masters are never allowed to sign ordinary
//! payloads.
//!
//! Private key halves are sealed under a passphrase and can be moved
//! between passphrase domains wholesale for wallet export and import.
//! Persistence goes through the `CredentialStore` trait; the engine never
//! assumes a particular backend.

pub mod armor;
pub mod credential;
pub mod error;
pub mod keypair;
pub mod keyselect;
pub mod reencrypt;
pub mod seal;
pub mod set;
pub mod validate;
pub mod wire;

// Re-export primary types and functions for convenience
pub use armor::{armor_credential, parse_armored};
pub use credential::{
    ContactData, Credential, CredentialForm, CredentialPayload, SignatureEntry,
    SignaturePresence, Verification, VerificationSet,
};
pub use error::{CredError, CredResult};
pub use keypair::{KeyAlgorithm, KeyBundle, KeyParams, Keypair};
pub use keyselect::select_keypair;
pub use seal::SealedSecret;
pub use set::CredentialSet;
pub use validate::{validate_child, validate_master};
pub use wire::{CredentialSetWire, WireMode, WIRE_VERSION};
