//! Wire/storage form of a credential set.
//!
//! Two modes: INDEX stores only IDs and relies on external storage for the
//! credentials themselves; FULL embeds the public forms (with signatures) of
//! the master and every active and revoked child. Private key material never
//! appears in either mode.

use crate::credential::Credential;
use crate::error::{CredError, CredResult};
use nymcred_core::{CredentialId, CredentialRole, NymId};
use serde::{Deserialize, Serialize};

pub const WIRE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMode {
    Index,
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSetWire {
    pub version: u32,
    pub nym_id: NymId,
    pub master_id: CredentialId,
    pub mode: WireMode,
    // INDEX mode:
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_child_ids: Vec<CredentialId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revoked_child_ids: Vec<CredentialId>,
    // FULL mode:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_credential: Option<Credential>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_children: Vec<Credential>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revoked_children: Vec<Credential>,
}

pub fn encode(wire: &CredentialSetWire) -> CredResult<Vec<u8>> {
    serde_json::to_vec(wire).map_err(|e| CredError::Serialization(e.to_string()))
}

/// Decode and check a credential set wire form.
///
/// FULL-mode forms must embed a master-role credential matching the declared
/// `master_id` and must not smuggle private key material.
pub fn decode(bytes: &[u8]) -> CredResult<CredentialSetWire> {
    let wire: CredentialSetWire =
        serde_json::from_slice(bytes).map_err(|e| CredError::Deserialization(e.to_string()))?;

    if wire.version != WIRE_VERSION {
        return Err(CredError::Deserialization(format!(
            "unsupported credential set version {}",
            wire.version
        )));
    }

    if wire.mode == WireMode::Full {
        let master = wire.master_credential.as_ref().ok_or_else(|| {
            CredError::Deserialization("full mode requires an embedded master credential".into())
        })?;

        if master.role() != CredentialRole::Master {
            return Err(CredError::RoleMismatch {
                expected: CredentialRole::Master,
                found: master.role(),
            });
        }

        if *master.id() != wire.master_id {
            return Err(CredError::Deserialization(format!(
                "declared master_id {} does not match embedded master {}",
                wire.master_id,
                master.id()
            )));
        }

        let embedded = std::iter::once(master)
            .chain(wire.active_children.iter())
            .chain(wire.revoked_children.iter());
        for cred in embedded {
            if cred.has_private() {
                return Err(CredError::Deserialization(
                    "wire form must not carry private key material".into(),
                ));
            }
        }
    }

    Ok(wire)
}
