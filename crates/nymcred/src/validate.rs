//! Trust-chain validation.
//!
//! A set is trusted when its master validates on its own (structure, derived
//! ID, self-signature) and every child's enrollment signature traces back to
//! that master. Both checks are boolean pass/fail; the aggregate decides what
//! to log and whether an invalid set is still usable.

use crate::credential::{Credential, CredentialForm, SignaturePresence};
use nymcred_core::{CredentialRole, SignatureRole};

/// Validate a master credential: correct role, key-bearing, declared ID
/// matches the content-derived ID, and the public self-signature verifies
/// against its own signing key.
pub fn validate_master(master: &Credential) -> bool {
    if master.role() != CredentialRole::Master {
        return false;
    }
    if master.master_id() != master.id() {
        return false;
    }

    let bundle = match master.keys() {
        Some(k) => k,
        None => return false,
    };

    match master.derive_id() {
        Ok(derived) if derived == *master.id() => {}
        _ => return false,
    }

    let message =
        match master.signable_bytes(CredentialForm::Public, SignaturePresence::WithoutSignatures) {
            Ok(m) => m,
            Err(_) => return false,
        };

    master
        .signatures()
        .iter()
        .filter(|s| s.role == SignatureRole::PublicCredential && s.signer_id == *master.id())
        .any(|s| bundle.signing.verify(&message, &s.bytes))
}

/// Validate a child credential against its issuing master: ID linkage plus
/// an enrollment signature that verifies against the master's signing key.
pub fn validate_child(child: &Credential, master: &Credential) -> bool {
    if child.role() == CredentialRole::Master {
        return false;
    }
    if child.master_id() != master.id() {
        return false;
    }

    let master_keys = match master.keys() {
        Some(k) => k,
        None => return false,
    };

    match child.derive_id() {
        Ok(derived) if derived == *child.id() => {}
        _ => return false,
    }

    let message =
        match child.signable_bytes(CredentialForm::Public, SignaturePresence::WithoutSignatures) {
            Ok(m) => m,
            Err(_) => return false,
        };

    child
        .signatures()
        .iter()
        .filter(|s| s.role == SignatureRole::PublicCredential && s.signer_id == *master.id())
        .any(|s| master_keys.signing.verify(&message, &s.bytes))
}
