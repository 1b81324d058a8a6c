//! The credential variant.
//!
//! A credential is a closed, role-tagged value: master and child-key
//! credentials carry three usage-tagged keypairs, contact and verification
//! credentials carry data payloads and no keys. All four roles expose the
//! same capability surface, so callers match on the role tag instead of
//! downcasting.
//!
//! Identity is content-derived: a credential's ID commits to its public
//! signable form. Signatures come in two flavors — public entries (the
//! master's enrollment signature, or a master's self-signature) cover the
//! public form, private entries cover the form that includes sealed key
//! material and are released and re-made whenever the seal changes.

use crate::error::{CredError, CredResult};
use crate::keypair::{KeyBundle, KeyParams};
use nymcred_core::{
    credential_id_for, CredentialId, CredentialRole, CredentialStore, KeyUsage, NymId, Passphrase,
    SignatureRole,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Contact data asserted by a contact credential.
/// BTreeMap keeps the signable form deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactData {
    pub items: BTreeMap<String, String>,
}

/// One verification claim, optionally signed by a child credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub claim_id: String,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureEntry>,
}

impl Verification {
    /// The form a verification is signed over: itself, minus the signature.
    pub fn signing_form(&self) -> Verification {
        Verification {
            claim_id: self.claim_id.clone(),
            approved: self.approved,
            signature: None,
        }
    }
}

/// The set of verification claims carried by a verify credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationSet {
    pub verifications: Vec<Verification>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CredentialPayload {
    None,
    Contact(ContactData),
    Verification(VerificationSet),
}

// ---------------------------------------------------------------------------
// SignatureEntry
// ---------------------------------------------------------------------------

/// A signature attached to a credential or produced over a payload.
/// `signer_id` traces the signature back to a specific credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub signer_id: CredentialId,
    pub role: SignatureRole,
    pub key_usage: KeyUsage,
    /// RFC 3339.
    pub signed_at: String,
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Signable form selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialForm {
    /// Public fields only; sealed private material stripped.
    Public,
    /// Includes sealed private key material.
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePresence {
    WithSignatures,
    /// Used when computing a credential's own signable form, to avoid
    /// self-reference.
    WithoutSignatures,
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    id: CredentialId,
    nym_id: NymId,
    /// Back-reference to the issuing master. Equals `id` for masters.
    master_id: CredentialId,
    role: CredentialRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keys: Option<KeyBundle>,
    payload: CredentialPayload,
    signatures: Vec<SignatureEntry>,
}

impl Credential {
    // -- constructors -------------------------------------------------------

    /// Generate a fresh master credential: three keypairs, self-signed in
    /// public mode and in private mode.
    pub fn new_master(
        nym_id: NymId,
        params: &KeyParams,
        passphrase: &Passphrase,
    ) -> CredResult<Self> {
        let keys = KeyBundle::generate(params, passphrase)
            .map_err(|e| CredError::KeyGeneration(format!("master key bundle: {}", e)))?;

        let mut cred = Self {
            id: CredentialId::new(""),
            nym_id,
            master_id: CredentialId::new(""),
            role: CredentialRole::Master,
            keys: Some(keys),
            payload: CredentialPayload::None,
            signatures: Vec::new(),
        };
        cred.id = cred.derive_id()?;
        cred.master_id = cred.id.clone();

        cred.self_sign_public(passphrase)?;
        cred.self_sign_private(passphrase)?;
        Ok(cred)
    }

    /// Generate a fresh child key credential, enrollment-signed by the
    /// master. `master_passphrase` unseals the master's signing key;
    /// `passphrase` seals the child's new private halves.
    pub fn new_child_key(
        master: &Credential,
        params: &KeyParams,
        master_passphrase: &Passphrase,
        passphrase: &Passphrase,
    ) -> CredResult<Self> {
        let keys = KeyBundle::generate(params, passphrase)
            .map_err(|e| CredError::KeyGeneration(format!("child key bundle: {}", e)))?;

        let mut cred = Self {
            id: CredentialId::new(""),
            nym_id: master.nym_id.clone(),
            master_id: master.id.clone(),
            role: CredentialRole::ChildKey,
            keys: Some(keys),
            payload: CredentialPayload::None,
            signatures: Vec::new(),
        };
        cred.id = cred.derive_id()?;

        master.sign_enrollment(&mut cred, master_passphrase)?;
        cred.self_sign_private(passphrase)?;
        Ok(cred)
    }

    /// Synthesize a contact credential from contact data.
    pub fn new_contact(
        master: &Credential,
        contact: ContactData,
        master_passphrase: &Passphrase,
    ) -> CredResult<Self> {
        Self::new_payload_credential(
            master,
            CredentialRole::Contact,
            CredentialPayload::Contact(contact),
            master_passphrase,
        )
    }

    /// Synthesize a verification credential from a verification set.
    pub fn new_verification(
        master: &Credential,
        verifications: VerificationSet,
        master_passphrase: &Passphrase,
    ) -> CredResult<Self> {
        Self::new_payload_credential(
            master,
            CredentialRole::Verify,
            CredentialPayload::Verification(verifications),
            master_passphrase,
        )
    }

    fn new_payload_credential(
        master: &Credential,
        role: CredentialRole,
        payload: CredentialPayload,
        master_passphrase: &Passphrase,
    ) -> CredResult<Self> {
        let mut cred = Self {
            id: CredentialId::new(""),
            nym_id: master.nym_id.clone(),
            master_id: master.id.clone(),
            role,
            keys: None,
            payload,
            signatures: Vec::new(),
        };
        cred.id = cred.derive_id()?;

        master.sign_enrollment(&mut cred, master_passphrase)?;
        Ok(cred)
    }

    // -- accessors ----------------------------------------------------------

    pub fn id(&self) -> &CredentialId {
        &self.id
    }

    pub fn nym_id(&self) -> &NymId {
        &self.nym_id
    }

    pub fn master_id(&self) -> &CredentialId {
        &self.master_id
    }

    pub fn role(&self) -> CredentialRole {
        self.role
    }

    pub fn keys(&self) -> Option<&KeyBundle> {
        self.keys.as_ref()
    }

    pub fn signatures(&self) -> &[SignatureEntry] {
        &self.signatures
    }

    pub fn contact_data(&self) -> Option<&ContactData> {
        match &self.payload {
            CredentialPayload::Contact(data) => Some(data),
            _ => None,
        }
    }

    pub fn verification_set(&self) -> Option<&VerificationSet> {
        match &self.payload {
            CredentialPayload::Verification(set) => Some(set),
            _ => None,
        }
    }

    /// True when this credential can produce payload signatures: a
    /// key-bearing credential whose signing key is unsealed-able.
    pub fn can_sign(&self) -> bool {
        self.keys
            .as_ref()
            .map(|k| k.signing.has_private())
            .unwrap_or(false)
    }

    /// Every stored credential carries its public fields.
    pub fn has_public(&self) -> bool {
        true
    }

    /// True when sealed private key material is present.
    /// Private implies public.
    pub fn has_private(&self) -> bool {
        self.keys.as_ref().map(|k| k.has_private()).unwrap_or(false)
    }

    // -- signable forms and identity ---------------------------------------

    /// Canonical bytes of the requested form. Deterministic: all maps are
    /// ordered and serde field order is fixed.
    pub fn signable_bytes(
        &self,
        form: CredentialForm,
        presence: SignaturePresence,
    ) -> CredResult<Vec<u8>> {
        let mut copy = match form {
            CredentialForm::Public => self.to_public(),
            CredentialForm::Private => self.clone(),
        };
        if presence == SignaturePresence::WithoutSignatures {
            copy.signatures.clear();
        }
        serde_json::to_vec(&copy).map_err(|e| CredError::Serialization(e.to_string()))
    }

    /// The bytes a credential's ID is derived from: the public form without
    /// signatures, with the self-referential ID fields cleared.
    fn id_material(&self) -> CredResult<Vec<u8>> {
        let mut copy = self.to_public();
        copy.signatures.clear();
        copy.id = CredentialId::new("");
        if copy.role == CredentialRole::Master {
            // A master's master_id is its own ID.
            copy.master_id = CredentialId::new("");
        }
        serde_json::to_vec(&copy).map_err(|e| CredError::Serialization(e.to_string()))
    }

    pub fn derive_id(&self) -> CredResult<CredentialId> {
        Ok(credential_id_for(&self.id_material()?))
    }

    /// Copy with sealed private material and private-mode signatures
    /// stripped. This is the only form that leaves the local store.
    pub fn to_public(&self) -> Self {
        Self {
            id: self.id.clone(),
            nym_id: self.nym_id.clone(),
            master_id: self.master_id.clone(),
            role: self.role,
            keys: self.keys.as_ref().map(|k| k.to_public()),
            payload: self.payload.clone(),
            signatures: self
                .signatures
                .iter()
                .filter(|s| s.role != SignatureRole::PrivateCredential)
                .cloned()
                .collect(),
        }
    }

    // -- signing ------------------------------------------------------------

    fn signing_keypair(&self) -> CredResult<&crate::keypair::Keypair> {
        self.keys
            .as_ref()
            .map(|k| &k.signing)
            .ok_or(CredError::NoSigningKeyAvailable)
    }

    /// Sign another credential's public form. This is the enrollment path —
    /// the only payload a master signs.
    pub fn sign_enrollment(
        &self,
        target: &mut Credential,
        passphrase: &Passphrase,
    ) -> CredResult<()> {
        let message =
            target.signable_bytes(CredentialForm::Public, SignaturePresence::WithoutSignatures)?;
        let bytes = self.signing_keypair()?.sign(&message, passphrase)?;
        target.signatures.push(SignatureEntry {
            signer_id: self.id.clone(),
            role: SignatureRole::PublicCredential,
            key_usage: KeyUsage::Signing,
            signed_at: chrono::Utc::now().to_rfc3339(),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    fn self_sign_public(&mut self, passphrase: &Passphrase) -> CredResult<()> {
        let message =
            self.signable_bytes(CredentialForm::Public, SignaturePresence::WithoutSignatures)?;
        let bytes = self.signing_keypair()?.sign(&message, passphrase)?;
        self.signatures.push(SignatureEntry {
            signer_id: self.id.clone(),
            role: SignatureRole::PublicCredential,
            key_usage: KeyUsage::Signing,
            signed_at: chrono::Utc::now().to_rfc3339(),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    /// Sign the private form, sealed key material included. Re-made after
    /// every re-encryption since the sealed bytes change.
    pub fn self_sign_private(&mut self, passphrase: &Passphrase) -> CredResult<()> {
        let message =
            self.signable_bytes(CredentialForm::Private, SignaturePresence::WithoutSignatures)?;
        let bytes = self.signing_keypair()?.sign(&message, passphrase)?;
        self.signatures.push(SignatureEntry {
            signer_id: self.id.clone(),
            role: SignatureRole::PrivateCredential,
            key_usage: KeyUsage::Signing,
            signed_at: chrono::Utc::now().to_rfc3339(),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    /// Drop signature entries. `private_only` keeps public entries (the
    /// enrollment chain stays intact across a re-encryption).
    pub fn release_signatures(&mut self, private_only: bool) {
        if private_only {
            self.signatures
                .retain(|s| s.role != SignatureRole::PrivateCredential);
        } else {
            self.signatures.clear();
        }
    }

    /// Sign an arbitrary payload with the keypair of the given usage.
    pub fn sign_payload(
        &self,
        payload: &[u8],
        role: SignatureRole,
        usage: KeyUsage,
        passphrase: &Passphrase,
    ) -> CredResult<SignatureEntry> {
        let keypair = self
            .keys
            .as_ref()
            .map(|k| k.get(usage))
            .ok_or(CredError::NoSigningKeyAvailable)?;
        let bytes = keypair.sign(payload, passphrase)?;
        Ok(SignatureEntry {
            signer_id: self.id.clone(),
            role,
            key_usage: usage,
            signed_at: chrono::Utc::now().to_rfc3339(),
            bytes: bytes.to_vec(),
        })
    }

    /// Verify a payload signature against the keypair of the given usage.
    pub fn verify_payload(
        &self,
        payload: &[u8],
        signature: &SignatureEntry,
        usage: KeyUsage,
    ) -> bool {
        match self.keys.as_ref() {
            Some(bundle) => bundle.get(usage).verify(payload, &signature.bytes),
            None => false,
        }
    }

    // -- key material -------------------------------------------------------

    /// Reseal every private key half under a new passphrase.
    pub fn re_encrypt_keys(&mut self, old: &Passphrase, new: &Passphrase) -> CredResult<()> {
        match self.keys.as_mut() {
            Some(bundle) => bundle.re_encrypt(old, new),
            None => Err(CredError::NoPrivateMaterial),
        }
    }

    // -- persistence --------------------------------------------------------

    /// Full local form, sealed private material included. Never leaves the
    /// local store.
    pub fn to_blob(&self) -> CredResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CredError::Serialization(e.to_string()))
    }

    pub fn from_blob(blob: &[u8]) -> CredResult<Self> {
        serde_json::from_slice(blob).map_err(|e| CredError::Deserialization(e.to_string()))
    }

    pub fn save(&self, store: &dyn CredentialStore) -> CredResult<()> {
        let blob = self.to_blob()?;
        store.store(&self.id, &blob)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(s: &str) -> Passphrase {
        Passphrase::new(s)
    }

    fn master() -> Credential {
        Credential::new_master(NymId::new("nym-1"), &KeyParams::default(), &pass("p")).unwrap()
    }

    #[test]
    fn test_master_is_self_rooted() {
        let m = master();
        assert_eq!(m.role(), CredentialRole::Master);
        assert_eq!(m.master_id(), m.id());
        assert!(m.has_private());
        assert_eq!(m.derive_id().unwrap(), *m.id());
    }

    #[test]
    fn test_master_carries_public_and_private_self_signatures() {
        let m = master();
        let roles: Vec<_> = m.signatures().iter().map(|s| s.role).collect();
        assert!(roles.contains(&SignatureRole::PublicCredential));
        assert!(roles.contains(&SignatureRole::PrivateCredential));
    }

    #[test]
    fn test_child_key_links_to_master() {
        let m = master();
        let child =
            Credential::new_child_key(&m, &KeyParams::default(), &pass("p"), &pass("p")).unwrap();
        assert_eq!(child.role(), CredentialRole::ChildKey);
        assert_eq!(child.master_id(), m.id());
        assert_eq!(child.nym_id(), m.nym_id());
        assert_ne!(child.id(), m.id());
        assert!(child.can_sign());
        // Enrollment signature traces back to the master.
        assert!(child
            .signatures()
            .iter()
            .any(|s| s.signer_id == *m.id() && s.role == SignatureRole::PublicCredential));
    }

    #[test]
    fn test_child_key_wrong_master_passphrase_fails() {
        let m = master();
        let result = Credential::new_child_key(&m, &KeyParams::default(), &pass("bad"), &pass("p"));
        assert!(result.is_err());
    }

    #[test]
    fn test_contact_credential_has_no_keys() {
        let m = master();
        let mut contact = ContactData::default();
        contact
            .items
            .insert("email".to_string(), "alice@example.com".to_string());
        let c = Credential::new_contact(&m, contact.clone(), &pass("p")).unwrap();
        assert_eq!(c.role(), CredentialRole::Contact);
        assert!(c.keys().is_none());
        assert!(!c.can_sign());
        assert!(!c.has_private());
        assert_eq!(c.contact_data(), Some(&contact));
    }

    #[test]
    fn test_to_public_strips_private_material() {
        let m = master();
        let public = m.to_public();
        assert!(!public.has_private());
        assert!(public
            .signatures()
            .iter()
            .all(|s| s.role != SignatureRole::PrivateCredential));
        // Identity is unchanged by stripping.
        assert_eq!(public.id(), m.id());
        assert_eq!(public.derive_id().unwrap(), *m.id());
    }

    #[test]
    fn test_payload_sign_verify_roundtrip() {
        let m = master();
        let child =
            Credential::new_child_key(&m, &KeyParams::default(), &pass("p"), &pass("p")).unwrap();
        let sig = child
            .sign_payload(b"hello", SignatureRole::Generic, KeyUsage::Signing, &pass("p"))
            .unwrap();
        assert_eq!(sig.signer_id, *child.id());
        assert!(child.verify_payload(b"hello", &sig, KeyUsage::Signing));
        assert!(!child.verify_payload(b"tampered", &sig, KeyUsage::Signing));
    }

    #[test]
    fn test_release_signatures_private_only() {
        let mut m = master();
        m.release_signatures(true);
        assert!(m
            .signatures()
            .iter()
            .all(|s| s.role == SignatureRole::PublicCredential));
        assert!(!m.signatures().is_empty());
        m.release_signatures(false);
        assert!(m.signatures().is_empty());
    }

    #[test]
    fn test_blob_roundtrip_preserves_private_material() {
        let m = master();
        let blob = m.to_blob().unwrap();
        let back = Credential::from_blob(&blob).unwrap();
        assert_eq!(back, m);
        assert!(back.has_private());
    }

    #[test]
    fn test_from_blob_rejects_garbage() {
        let result = Credential::from_blob(b"not json at all");
        assert!(matches!(result, Err(CredError::Deserialization(_))));
    }

    #[test]
    fn test_signable_bytes_deterministic() {
        let m = master();
        let b1 = m
            .signable_bytes(CredentialForm::Public, SignaturePresence::WithoutSignatures)
            .unwrap();
        let b2 = m
            .signable_bytes(CredentialForm::Public, SignaturePresence::WithoutSignatures)
            .unwrap();
        assert_eq!(b1, b2);
    }

    #[test]
    fn test_verification_signing_form_strips_signature() {
        let v = Verification {
            claim_id: "claim-1".to_string(),
            approved: true,
            signature: Some(SignatureEntry {
                signer_id: CredentialId::new("x"),
                role: SignatureRole::Claim,
                key_usage: KeyUsage::Signing,
                signed_at: "2024-01-01T00:00:00Z".to_string(),
                bytes: vec![1, 2, 3],
            }),
        };
        let form = v.signing_form();
        assert!(form.signature.is_none());
        assert_eq!(form.claim_id, v.claim_id);
    }
}
