use crate::error::{CredError, CredResult};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};
use hkdf::Hkdf;
use nymcred_core::Passphrase;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

// Passphrase-sealed secrets.
//
// Private key halves never exist in storage or on the wire unsealed. Each
// seal derives its own key via HKDF-SHA256 from the passphrase and a random
// salt, then encrypts with AES-256-GCM under a random nonce. Salt and nonce
// travel with the ciphertext; the passphrase does not.

const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12; // AES-GCM standard nonce size
const SEAL_INFO: &[u8] = b"nymcred-private-key-seal";

/// Sealed secret material: salt + nonce + ciphertext (includes GCM tag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

fn sealing_key(passphrase: &Passphrase, salt: &[u8]) -> CredResult<Zeroizing<[u8; 32]>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), passphrase.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(SEAL_INFO, &mut okm)
        .map_err(|e| CredError::Crypto(format!("HKDF expand failed: {}", e)))?;
    Ok(Zeroizing::new(okm))
}

impl SealedSecret {
    /// Seal plaintext under a passphrase-derived key.
    pub fn seal(passphrase: &Passphrase, plaintext: &[u8]) -> CredResult<Self> {
        let mut salt = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let key = sealing_key(passphrase, &salt)?;

        let cipher = Aes256Gcm::new_from_slice(&*key)
            .map_err(|e| CredError::Crypto(format!("cipher init failed: {}", e)))?;

        let mut nonce = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(AesNonce::from_slice(&nonce), plaintext)
            .map_err(|e| CredError::Crypto(format!("seal failed: {}", e)))?;

        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }

    /// Open the seal. Fails if the passphrase is wrong or the ciphertext
    /// was tampered with; the two cases are indistinguishable by design.
    pub fn open(&self, passphrase: &Passphrase) -> CredResult<Zeroizing<Vec<u8>>> {
        let key = sealing_key(passphrase, &self.salt)?;

        let cipher = Aes256Gcm::new_from_slice(&*key)
            .map_err(|e| CredError::Crypto(format!("cipher init failed: {}", e)))?;

        let plaintext = cipher
            .decrypt(AesNonce::from_slice(&self.nonce), self.ciphertext.as_ref())
            .map_err(|_| CredError::Crypto("seal open failed".to_string()))?;

        Ok(Zeroizing::new(plaintext))
    }

    /// Move the secret from one passphrase domain to another.
    /// The plaintext exists only inside this call.
    pub fn reseal(&self, old: &Passphrase, new: &Passphrase) -> CredResult<Self> {
        let plaintext = self.open(old)?;
        Self::seal(new, &plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(s: &str) -> Passphrase {
        Passphrase::new(s)
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let sealed = SealedSecret::seal(&pass("correct horse"), b"secret key bytes").unwrap();
        let opened = sealed.open(&pass("correct horse")).unwrap();
        assert_eq!(&**opened, b"secret key bytes");
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let sealed = SealedSecret::seal(&pass("right"), b"secret").unwrap();
        assert!(sealed.open(&pass("wrong")).is_err());
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_seal() {
        let s1 = SealedSecret::seal(&pass("p"), b"same plaintext").unwrap();
        let s2 = SealedSecret::seal(&pass("p"), b"same plaintext").unwrap();
        assert_ne!(s1.salt, s2.salt);
        assert_ne!(s1.nonce, s2.nonce);
        assert_ne!(s1.ciphertext, s2.ciphertext);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let mut sealed = SealedSecret::seal(&pass("p"), b"integrity").unwrap();
        if let Some(byte) = sealed.ciphertext.first_mut() {
            *byte ^= 0x01;
        }
        assert!(sealed.open(&pass("p")).is_err());
    }

    #[test]
    fn test_reseal_moves_passphrase_domain() {
        let sealed = SealedSecret::seal(&pass("old"), b"moving secret").unwrap();
        let resealed = sealed.reseal(&pass("old"), &pass("new")).unwrap();
        assert!(resealed.open(&pass("old")).is_err());
        assert_eq!(&**resealed.open(&pass("new")).unwrap(), b"moving secret");
    }

    #[test]
    fn test_reseal_with_wrong_old_passphrase_fails() {
        let sealed = SealedSecret::seal(&pass("old"), b"secret").unwrap();
        assert!(sealed.reseal(&pass("not old"), &pass("new")).is_err());
    }

    #[test]
    fn test_sealed_secret_serde() {
        let sealed = SealedSecret::seal(&pass("p"), b"serialize me").unwrap();
        let json = serde_json::to_string(&sealed).unwrap();
        let back: SealedSecret = serde_json::from_str(&json).unwrap();
        assert_eq!(sealed, back);
        assert_eq!(&**back.open(&pass("p")).unwrap(), b"serialize me");
    }
}
