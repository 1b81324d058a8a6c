//! Passphrase migration for a whole credential set.
//!
//! Moving a set between passphrase domains (wallet export, wallet import)
//! reseals every private key half. The operation is sequential and has a
//! point of no return: a failure before the master is persisted aborts
//! cleanly, a failure after it leaves the set split across two passphrase
//! domains. Callers must treat an error as "reload from storage before
//! trusting in-memory state".

use crate::error::{CredError, CredResult};
use crate::set::CredentialSet;
use nymcred_core::{CredentialId, CredentialStore, Passphrase};

/// Reseal the private halves of the master and every key-bearing active
/// child under `new`.
///
/// When `importing` is set the private-mode self-signatures are released and
/// re-made under the new passphrase and each credential is persisted as it
/// completes, so an interrupted import can resume from storage. An export
/// (`importing == false`) keeps signatures untouched and persists only the
/// resealed master; the children exist resealed in memory for the caller to
/// serialize out.
pub fn re_encrypt_private_credentials(
    set: &mut CredentialSet,
    old: &Passphrase,
    new: &Passphrase,
    importing: bool,
    store: &dyn CredentialStore,
) -> CredResult<()> {
    if !set.master().has_private() {
        return Err(CredError::NoPrivateMaterial);
    }

    // Master first. Failures up to the save below abort with the in-memory
    // master already modified but nothing persisted.
    let master = set.master_mut();
    master.re_encrypt_keys(old, new).map_err(|e| {
        tracing::warn!(error = %e, "failed to re-encrypt master credential");
        e
    })?;

    if importing {
        master.release_signatures(true);
        master.self_sign_private(new)?;
    }
    master.save(store)?;

    // Point of no return: the master is now persisted under the new
    // passphrase. A child failure from here on leaves a split set.
    let child_ids: Vec<CredentialId> = set
        .active_children()
        .filter(|c| c.has_private())
        .map(|c| c.id().clone())
        .collect();

    for id in child_ids {
        let Some(child) = set.active_children_mut().get_mut(&id) else {
            continue;
        };

        child.re_encrypt_keys(old, new).map_err(|e| {
            tracing::warn!(credential_id = %id, error = %e, "failed to re-encrypt child credential");
            e
        })?;

        if importing {
            child.release_signatures(true);
            child.self_sign_private(new)?;
            child.save(store)?;
        }
    }

    Ok(())
}
