use crate::error::{CredError, CredResult};
use crate::seal::SealedSecret;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use nymcred_core::{KeyUsage, Passphrase};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

// ---------------------------------------------------------------------------
// KeyAlgorithm / KeyParams — key generation parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    Ed25519,
}

/// Parameters for generating a fresh credential set.
#[derive(Debug, Clone, Copy)]
pub struct KeyParams {
    pub algorithm: KeyAlgorithm,
}

impl Default for KeyParams {
    fn default() -> Self {
        Self {
            algorithm: KeyAlgorithm::Ed25519,
        }
    }
}

// ---------------------------------------------------------------------------
// Keypair — one usage-tagged asymmetric keypair
// ---------------------------------------------------------------------------

/// A usage-tagged Ed25519 keypair. The public half is always present; the
/// private half, when present, is sealed under a passphrase and never
/// serialized in the clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypair {
    usage: KeyUsage,
    #[serde(with = "pubkey_hex")]
    public: [u8; 32],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private: Option<SealedSecret>,
}

impl Keypair {
    /// Generate a fresh keypair and seal its private half.
    pub fn generate(
        usage: KeyUsage,
        params: &KeyParams,
        passphrase: &Passphrase,
    ) -> CredResult<Self> {
        match params.algorithm {
            KeyAlgorithm::Ed25519 => {}
        }

        let mut secret = Zeroizing::new([0u8; 32]);
        rand::rngs::OsRng.fill_bytes(&mut *secret);

        let signing_key = SigningKey::from_bytes(&secret);
        let public = signing_key.verifying_key().to_bytes();
        let private = SealedSecret::seal(passphrase, &*secret)
            .map_err(|e| CredError::KeyGeneration(format!("sealing {} key: {}", usage, e)))?;

        Ok(Self {
            usage,
            public,
            private: Some(private),
        })
    }

    pub fn usage(&self) -> KeyUsage {
        self.usage
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public
    }

    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    /// Sign a message with the sealed private key.
    pub fn sign(&self, message: &[u8], passphrase: &Passphrase) -> CredResult<[u8; 64]> {
        let sealed = self.private.as_ref().ok_or(CredError::NoPrivateMaterial)?;
        let secret = sealed.open(passphrase)?;

        let secret_bytes: [u8; 32] = secret
            .as_slice()
            .try_into()
            .map_err(|_| CredError::Crypto("unsealed key has wrong length".to_string()))?;
        let signing_key = SigningKey::from_bytes(&secret_bytes);

        // The sealed half must belong to the stored public half.
        if signing_key.verifying_key().to_bytes() != self.public {
            return Err(CredError::Crypto(
                "sealed private key does not match public key".to_string(),
            ));
        }

        Ok(signing_key.sign(message).to_bytes())
    }

    /// Verify a signature against the public half.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let verifying_key = match VerifyingKey::from_bytes(&self.public) {
            Ok(k) => k,
            Err(_) => return false,
        };

        let sig_bytes: [u8; 64] = match signature.try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };

        verifying_key
            .verify(message, &Signature::from_bytes(&sig_bytes))
            .is_ok()
    }

    /// Reseal the private half under a new passphrase.
    pub fn re_encrypt(&mut self, old: &Passphrase, new: &Passphrase) -> CredResult<()> {
        let sealed = self.private.as_ref().ok_or(CredError::NoPrivateMaterial)?;
        self.private = Some(sealed.reseal(old, new)?);
        Ok(())
    }

    /// Copy with the private half stripped.
    pub fn to_public(&self) -> Self {
        Self {
            usage: self.usage,
            public: self.public,
            private: None,
        }
    }
}

// ---------------------------------------------------------------------------
// KeyBundle — the three keypairs of a key-bearing credential
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBundle {
    pub authentication: Keypair,
    pub encryption: Keypair,
    pub signing: Keypair,
}

impl KeyBundle {
    pub fn generate(params: &KeyParams, passphrase: &Passphrase) -> CredResult<Self> {
        Ok(Self {
            authentication: Keypair::generate(KeyUsage::Authentication, params, passphrase)?,
            encryption: Keypair::generate(KeyUsage::Encryption, params, passphrase)?,
            signing: Keypair::generate(KeyUsage::Signing, params, passphrase)?,
        })
    }

    pub fn get(&self, usage: KeyUsage) -> &Keypair {
        match usage {
            KeyUsage::Authentication => &self.authentication,
            KeyUsage::Encryption => &self.encryption,
            KeyUsage::Signing => &self.signing,
        }
    }

    pub fn has_private(&self) -> bool {
        self.authentication.has_private()
            && self.encryption.has_private()
            && self.signing.has_private()
    }

    /// Reseal all three private halves. Not atomic: a mid-bundle failure
    /// leaves earlier keypairs resealed, so callers treat any failure as
    /// discard-the-object.
    pub fn re_encrypt(&mut self, old: &Passphrase, new: &Passphrase) -> CredResult<()> {
        self.authentication.re_encrypt(old, new)?;
        self.encryption.re_encrypt(old, new)?;
        self.signing.re_encrypt(old, new)?;
        Ok(())
    }

    pub fn to_public(&self) -> Self {
        Self {
            authentication: self.authentication.to_public(),
            encryption: self.encryption.to_public(),
            signing: self.signing.to_public(),
        }
    }
}

// ---------------------------------------------------------------------------
// Hex serialization for the 32-byte public key
// ---------------------------------------------------------------------------

mod pubkey_hex {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}
