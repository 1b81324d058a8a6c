//! The credential set aggregate.
//!
//! One master credential plus a map of child credentials, all owned by the
//! set. The master self-signs and authorizes children; children do the
//! ordinary work. Masters never sign application payloads — their one
//! permitted signing path is credential enrollment — and signatures always
//! trace back to a specific credential by ID.
//!
//! The set assumes exclusive access per call; the owning identity layer is
//! responsible for serializing concurrent use.

use crate::armor;
use crate::credential::{
    ContactData, Credential, SignatureEntry, Verification, VerificationSet,
};
use crate::error::{CredError, CredResult};
use crate::keypair::{KeyParams, Keypair};
use crate::keyselect;
use crate::reencrypt;
use crate::validate;
use crate::wire::{CredentialSetWire, WireMode, WIRE_VERSION};
use nymcred_core::{
    CredentialId, CredentialRole, CredentialStore, KeyUsage, NymId, NymIdSource, Passphrase,
    SignatureRole,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub struct CredentialSet {
    nym_id: NymId,
    /// Shared handle to the externally-owned identity descriptor.
    source: Arc<dyn NymIdSource>,
    master: Credential,
    active_children: BTreeMap<CredentialId, Credential>,
    /// Populated only by FULL-mode deserialization. Revocation bookkeeping
    /// is the owning identity layer's job; see `revoke_contact_credentials`.
    revoked_children: BTreeMap<CredentialId, Credential>,
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("nym_id", &self.nym_id)
            .field("master_id", self.master.id())
            .field("active_children", &self.active_children.len())
            .field("revoked_children", &self.revoked_children.len())
            .finish()
    }
}

impl CredentialSet {
    // -- construction -------------------------------------------------------

    /// Generate a fresh set: a new master credential plus one child key
    /// credential.
    pub fn create(
        source: Arc<dyn NymIdSource>,
        params: &KeyParams,
        passphrase: &Passphrase,
    ) -> CredResult<Self> {
        let nym_id = source.nym_id();
        let master = Credential::new_master(nym_id.clone(), params, passphrase)?;
        let child = Credential::new_child_key(&master, params, passphrase, passphrase)?;

        let mut set = Self {
            nym_id,
            source,
            master,
            active_children: BTreeMap::new(),
            revoked_children: BTreeMap::new(),
        };
        set.active_children.insert(child.id().clone(), child);
        Ok(set)
    }

    /// Reconstruct from fully embedded credential forms.
    pub fn load_full(
        source: Arc<dyn NymIdSource>,
        master: Credential,
        children: Vec<Credential>,
    ) -> CredResult<Self> {
        if master.role() != CredentialRole::Master {
            return Err(CredError::RoleMismatch {
                expected: CredentialRole::Master,
                found: master.role(),
            });
        }

        let mut set = Self {
            nym_id: source.nym_id(),
            source,
            master,
            active_children: BTreeMap::new(),
            revoked_children: BTreeMap::new(),
        };
        for child in children {
            set.load_child(child)?;
        }
        Ok(set)
    }

    /// Reconstruct from storage by ID: the master blob first, then each
    /// child blob. Any missing ID fails the whole load; no partial set is
    /// returned.
    pub fn load_indexed(
        source: Arc<dyn NymIdSource>,
        master_id: &CredentialId,
        child_ids: &[CredentialId],
        store: &dyn CredentialStore,
    ) -> CredResult<Self> {
        let blob = store
            .load(master_id)?
            .ok_or_else(|| CredError::NotFound(master_id.clone()))?;
        let master = Credential::from_blob(&blob)?;

        if master.role() != CredentialRole::Master {
            return Err(CredError::RoleMismatch {
                expected: CredentialRole::Master,
                found: master.role(),
            });
        }

        let mut set = Self {
            nym_id: source.nym_id(),
            source,
            master,
            active_children: BTreeMap::new(),
            revoked_children: BTreeMap::new(),
        };
        for child_id in child_ids {
            let blob = store
                .load(child_id)?
                .ok_or_else(|| CredError::NotFound(child_id.clone()))?;
            set.load_child(Credential::from_blob(&blob)?)?;
        }
        Ok(set)
    }

    /// Reconstruct from a decoded wire form. INDEX mode fetches every
    /// credential from the store; FULL mode uses the embedded public forms.
    pub fn from_wire(
        source: Arc<dyn NymIdSource>,
        wire: CredentialSetWire,
        store: &dyn CredentialStore,
    ) -> CredResult<Self> {
        match wire.mode {
            WireMode::Index => {
                Self::load_indexed(source, &wire.master_id, &wire.active_child_ids, store)
            }
            WireMode::Full => {
                let master = wire.master_credential.ok_or_else(|| {
                    CredError::Deserialization(
                        "full mode requires an embedded master credential".into(),
                    )
                })?;
                let mut set = Self::load_full(source, master, wire.active_children)?;
                for revoked in wire.revoked_children {
                    if revoked.role() == CredentialRole::Master {
                        return Err(CredError::RoleMismatch {
                            expected: CredentialRole::ChildKey,
                            found: CredentialRole::Master,
                        });
                    }
                    set.revoked_children.insert(revoked.id().clone(), revoked);
                }
                Ok(set)
            }
        }
    }

    /// Load a single master credential from its armored text form.
    pub fn load_master_from_armored(
        source: Arc<dyn NymIdSource>,
        input: &str,
    ) -> CredResult<Self> {
        let master = armor::parse_armored(input)?;
        if master.role() != CredentialRole::Master {
            return Err(CredError::RoleMismatch {
                expected: CredentialRole::Master,
                found: master.role(),
            });
        }
        Ok(Self {
            nym_id: source.nym_id(),
            source,
            master,
            active_children: BTreeMap::new(),
            revoked_children: BTreeMap::new(),
        })
    }

    /// Insert a child credential, replacing (with a warning) any credential
    /// already loaded under the same ID.
    pub fn load_child(&mut self, credential: Credential) -> CredResult<()> {
        if credential.role() == CredentialRole::Master {
            return Err(CredError::RoleMismatch {
                expected: CredentialRole::ChildKey,
                found: CredentialRole::Master,
            });
        }

        let id = credential.id().clone();
        if self.active_children.contains_key(&id) {
            tracing::warn!(credential_id = %id, "replacing child credential that was already loaded");
        }
        self.active_children.insert(id, credential);
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    pub fn nym_id(&self) -> &NymId {
        &self.nym_id
    }

    pub fn source(&self) -> &Arc<dyn NymIdSource> {
        &self.source
    }

    pub fn master(&self) -> &Credential {
        &self.master
    }

    pub fn master_id(&self) -> &CredentialId {
        self.master.id()
    }

    pub(crate) fn master_mut(&mut self) -> &mut Credential {
        &mut self.master
    }

    pub fn active_children(&self) -> impl Iterator<Item = &Credential> {
        self.active_children.values()
    }

    pub(crate) fn active_children_mut(&mut self) -> &mut BTreeMap<CredentialId, Credential> {
        &mut self.active_children
    }

    pub fn child_count(&self) -> usize {
        self.active_children.len()
    }

    pub fn active_child_ids(&self) -> Vec<CredentialId> {
        self.active_children.keys().cloned().collect()
    }

    pub fn revoked_child_ids(&self) -> Vec<CredentialId> {
        self.revoked_children.keys().cloned().collect()
    }

    /// Look up an active child by ID, skipping any ID on the caller's
    /// exclusion list (the identity layer's revoked-ID bookkeeping).
    pub fn child(
        &self,
        id: &CredentialId,
        excluded: Option<&[CredentialId]>,
    ) -> Option<&Credential> {
        if let Some(excluded) = excluded {
            if excluded.contains(id) {
                return None;
            }
        }
        self.active_children.get(id)
    }

    pub fn child_by_index(&self, index: usize) -> Option<&Credential> {
        if index >= self.active_children.len() {
            tracing::debug!(index, "child index out of bounds");
            return None;
        }
        self.active_children.values().nth(index)
    }

    pub fn child_id_by_index(&self, index: usize) -> Option<&CredentialId> {
        if index >= self.active_children.len() {
            tracing::debug!(index, "child index out of bounds");
            return None;
        }
        self.active_children.keys().nth(index)
    }

    /// True when any child carries public credential data.
    /// A private credential is by definition a public one as well.
    pub fn has_public(&self) -> bool {
        self.active_children
            .values()
            .any(|c| c.has_public() || c.has_private())
    }

    pub fn has_private(&self) -> bool {
        self.active_children.values().any(|c| c.has_private())
    }

    // -- validation ---------------------------------------------------------

    /// Check the whole trust chain: the master on its own, then every
    /// active child against the master. Short-circuits on the first
    /// failure and logs which credential failed; never raises.
    pub fn verify_internally(&self) -> bool {
        if !validate::validate_master(&self.master) {
            tracing::warn!(
                nym_id = %self.nym_id,
                error = %CredError::Validation(self.master.id().clone()),
                "master credential failed to verify"
            );
            return false;
        }

        for (id, child) in &self.active_children {
            if !validate::validate_child(child, &self.master) {
                tracing::warn!(
                    nym_id = %self.nym_id,
                    error = %CredError::Validation(id.clone()),
                    "child credential failed to verify"
                );
                return false;
            }
        }

        true
    }

    // -- key selection ------------------------------------------------------

    /// The keypair serving the given usage; first qualifying child, master
    /// fallback.
    pub fn keypair_for(
        &self,
        usage: KeyUsage,
        excluded: Option<&[CredentialId]>,
    ) -> CredResult<&Keypair> {
        keyselect::select_keypair(self.active_children.values(), &self.master, usage, excluded)
    }

    pub fn public_key_for(
        &self,
        usage: KeyUsage,
        excluded: Option<&[CredentialId]>,
    ) -> CredResult<&[u8; 32]> {
        Ok(self.keypair_for(usage, excluded)?.public_key())
    }

    // -- child credential factories ----------------------------------------

    /// Synthesize and insert a contact credential. Returns false, inserting
    /// nothing, when the factory fails.
    pub fn add_contact_credential(
        &mut self,
        contact: ContactData,
        passphrase: &Passphrase,
    ) -> bool {
        match Credential::new_contact(&self.master, contact, passphrase) {
            Ok(credential) => {
                self.active_children
                    .insert(credential.id().clone(), credential);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to create contact credential");
                false
            }
        }
    }

    /// Synthesize and insert a verification credential. Returns false,
    /// inserting nothing, when the factory fails.
    pub fn add_verification_credential(
        &mut self,
        verifications: VerificationSet,
        passphrase: &Passphrase,
    ) -> bool {
        match Credential::new_verification(&self.master, verifications, passphrase) {
            Ok(credential) => {
                self.active_children
                    .insert(credential.id().clone(), credential);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to create verification credential");
                false
            }
        }
    }

    // -- revocation ---------------------------------------------------------

    /// Remove every contact credential from the active map, appending their
    /// IDs to the caller's list. The caller (the owning identity layer)
    /// keeps the authoritative revoked-ID records.
    pub fn revoke_contact_credentials(&mut self, revoked_ids: &mut Vec<CredentialId>) {
        self.revoke_role(CredentialRole::Contact, revoked_ids);
    }

    /// Remove every verification credential from the active map, appending
    /// their IDs to the caller's list.
    pub fn revoke_verification_credentials(&mut self, revoked_ids: &mut Vec<CredentialId>) {
        self.revoke_role(CredentialRole::Verify, revoked_ids);
    }

    fn revoke_role(&mut self, role: CredentialRole, revoked_ids: &mut Vec<CredentialId>) {
        let matching: Vec<CredentialId> = self
            .active_children
            .values()
            .filter(|c| c.role() == role)
            .map(|c| c.id().clone())
            .collect();

        for id in matching {
            self.active_children.remove(&id);
            revoked_ids.push(id);
        }
    }

    // -- signing and verification ------------------------------------------

    /// Sign a payload. `PublicCredential` signatures go to the master (its
    /// enrollment-signing role); `NymIdSource` and `PrivateCredential`
    /// signatures can not be produced at the set level; everything else is
    /// delegated to the first active child that can sign.
    pub fn sign(
        &self,
        payload: &[u8],
        role: SignatureRole,
        usage: KeyUsage,
        passphrase: &Passphrase,
    ) -> CredResult<SignatureEntry> {
        match role {
            SignatureRole::PublicCredential => {
                self.master.sign_payload(payload, role, usage, passphrase)
            }
            SignatureRole::NymIdSource | SignatureRole::PrivateCredential => {
                Err(CredError::UnsupportedSignatureRole(role))
            }
            _ => {
                for child in self.active_children.values() {
                    if child.can_sign() {
                        return child.sign_payload(payload, role, usage, passphrase);
                    }
                }
                Err(CredError::NoSigningKeyAvailable)
            }
        }
    }

    /// Verify a payload signature by resolving its signer. A signature
    /// claiming the master as signer never validates: masters are only
    /// allowed to sign other credentials. Revocation state is deliberately
    /// not consulted — historical signatures must stay verifiable.
    pub fn verify(&self, payload: &[u8], signature: &SignatureEntry, usage: KeyUsage) -> bool {
        if signature.signer_id == *self.master.id() {
            tracing::warn!(
                master_id = %self.master.id(),
                "{}", CredError::MasterCannotSignPayload
            );
            return false;
        }

        match self.active_children.get(&signature.signer_id) {
            Some(child) => child.verify_payload(payload, signature, usage),
            None => {
                tracing::debug!(
                    signer_id = %signature.signer_id,
                    "this credential set does not contain the credential which produced the signature"
                );
                false
            }
        }
    }

    /// Verify a signed verification claim against its signing form.
    pub fn verify_claim(&self, verification: &Verification) -> bool {
        let signature = match &verification.signature {
            Some(s) => s,
            None => return false,
        };

        let form = verification.signing_form();
        let payload = match serde_json::to_vec(&form) {
            Ok(p) => p,
            Err(_) => return false,
        };

        self.verify(&payload, signature, signature.key_usage)
    }

    /// Enrollment-sign another credential with the master. This is the one
    /// signing path a master is permitted.
    pub fn sign_enrollment(
        &self,
        target: &mut Credential,
        passphrase: &Passphrase,
    ) -> CredResult<()> {
        self.master.sign_enrollment(target, passphrase)
    }

    // -- payload lookups ----------------------------------------------------

    /// Contact data from the contact-role children. When more than one
    /// contact credential exists the last one (in stored order) wins; a set
    /// is expected to hold exactly one.
    pub fn contact_data(&self) -> Option<ContactData> {
        let mut found = None;
        for child in self.active_children.values() {
            if child.role() == CredentialRole::Contact {
                found = child.contact_data().cloned();
            }
        }
        found
    }

    /// Verification set from the verify-role children. Last match wins, as
    /// with `contact_data`.
    pub fn verification_set(&self) -> Option<VerificationSet> {
        let mut found = None;
        for child in self.active_children.values() {
            if child.role() == CredentialRole::Verify {
                found = child.verification_set().cloned();
            }
        }
        found
    }

    // -- persistence and serialization -------------------------------------

    /// Persist the master and every active child. Writes are sequential;
    /// a mid-sequence failure is reported, not rolled back, so callers must
    /// treat failure as "partially persisted, retry idempotently".
    pub fn write_credentials(&self, store: &dyn CredentialStore) -> CredResult<()> {
        self.master.save(store).map_err(|e| {
            tracing::warn!(master_id = %self.master.id(), "failed to save master credential");
            e
        })?;

        for (id, child) in &self.active_children {
            if let Err(e) = child.save(store) {
                tracing::warn!(
                    credential_id = %id,
                    "failed to save child credential; earlier writes were not rolled back"
                );
                return Err(e);
            }
        }

        Ok(())
    }

    /// Build the wire form. INDEX mode carries IDs only; FULL mode embeds
    /// the public forms of the master and all children, active and revoked.
    pub fn serialize(&self, mode: WireMode) -> CredentialSetWire {
        match mode {
            WireMode::Index => CredentialSetWire {
                version: WIRE_VERSION,
                nym_id: self.nym_id.clone(),
                master_id: self.master.id().clone(),
                mode,
                active_child_ids: self.active_children.keys().cloned().collect(),
                revoked_child_ids: self.revoked_children.keys().cloned().collect(),
                master_credential: None,
                active_children: Vec::new(),
                revoked_children: Vec::new(),
            },
            WireMode::Full => CredentialSetWire {
                version: WIRE_VERSION,
                nym_id: self.nym_id.clone(),
                master_id: self.master.id().clone(),
                mode,
                active_child_ids: Vec::new(),
                revoked_child_ids: Vec::new(),
                master_credential: Some(self.master.to_public()),
                active_children: self
                    .active_children
                    .values()
                    .map(|c| c.to_public())
                    .collect(),
                revoked_children: self
                    .revoked_children
                    .values()
                    .map(|c| c.to_public())
                    .collect(),
            },
        }
    }

    pub fn to_wire_bytes(&self, mode: WireMode) -> CredResult<Vec<u8>> {
        crate::wire::encode(&self.serialize(mode))
    }

    /// Armored text export of the public master credential, for out-of-band
    /// transfer.
    pub fn master_as_armored(&self) -> CredResult<String> {
        armor::armor_credential(&self.master)
    }

    // -- re-encryption ------------------------------------------------------

    /// Move every private key half in the set to a new passphrase domain.
    /// See [`crate::reencrypt`] for the exact algorithm and its
    /// cancel-on-failure (not roll-back-on-failure) semantics.
    pub fn re_encrypt_private_credentials(
        &mut self,
        old: &Passphrase,
        new: &Passphrase,
        importing: bool,
        store: &dyn CredentialStore,
    ) -> CredResult<()> {
        reencrypt::re_encrypt_private_credentials(self, old, new, importing, store)
    }
}
