//! AES-256-GCM sealing of personal data at rest.
//!
//! Travel documents on contacts and the profile snapshots kept on trip
//! travelers are stored as `nonce || ciphertext` in `BYTEA` columns.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AppError, AppResult};

/// Nonce size for AES-GCM (96 bits).
const NONCE_SIZE: usize = 12;

/// Key size for AES-256.
const KEY_SIZE: usize = 32;

/// Seals and opens personal data with one agency-wide key.
#[derive(Clone)]
pub struct Encryptor {
    cipher: Aes256Gcm,
}

impl Encryptor {
    /// Build from a base64-encoded 32-byte key.
    pub fn from_base64(key_base64: &str) -> AppResult<Self> {
        let key_bytes = BASE64
            .decode(key_base64.trim())
            .map_err(|e| AppError::Config(format!("Invalid base64 encryption key: {}", e)))?;

        Self::from_bytes(&key_bytes)
    }

    pub fn from_bytes(key_bytes: &[u8]) -> AppResult<Self> {
        if key_bytes.len() != KEY_SIZE {
            return Err(AppError::Config(format!(
                "Invalid encryption key length: expected {} bytes, got {}",
                KEY_SIZE,
                key_bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(key_bytes)
            .map_err(|e| AppError::Encryption(format!("Failed to create cipher: {}", e)))?;

        Ok(Self { cipher })
    }

    /// Random key, base64-encoded.
    #[cfg(test)]
    pub fn generate_key_base64() -> String {
        let mut key = [0u8; KEY_SIZE];
        rand::thread_rng().fill(&mut key[..]);
        BASE64.encode(key)
    }

    /// Encrypt and prepend a fresh random nonce.
    pub fn seal(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| AppError::Encryption(format!("Encryption failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Inverse of [`Encryptor::seal`].
    pub fn open(&self, sealed: &[u8]) -> AppResult<Vec<u8>> {
        if sealed.len() < NONCE_SIZE {
            return Err(AppError::Encryption(
                "Ciphertext too short (missing nonce)".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| AppError::Encryption(format!("Decryption failed: {}", e)))
    }

    /// Serialize to JSON and seal.
    pub fn seal_json<T: Serialize>(&self, value: &T) -> AppResult<Vec<u8>> {
        let json = serde_json::to_vec(value)?;
        self.seal(&json)
    }

    /// Open and deserialize from JSON.
    pub fn open_json<T: DeserializeOwned>(&self, sealed: &[u8]) -> AppResult<T> {
        let json = self.open(sealed)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TravelerProfile;

    fn encryptor() -> Encryptor {
        Encryptor::from_base64(&Encryptor::generate_key_base64()).unwrap()
    }

    #[test]
    fn test_seal_open() {
        let enc = encryptor();
        let sealed = enc.seal(b"P1234567").unwrap();
        assert!(sealed.len() > NONCE_SIZE + 8);
        assert_eq!(enc.open(&sealed).unwrap(), b"P1234567");
    }

    #[test]
    fn test_nonce_is_fresh_per_seal() {
        let enc = encryptor();
        assert_ne!(enc.seal(b"same").unwrap(), enc.seal(b"same").unwrap());
    }

    #[test]
    fn test_profile_round_trip() {
        let enc = encryptor();
        let profile = TravelerProfile {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            passport_number: Some("AB123456".to_string()),
            ..Default::default()
        };
        let sealed = enc.seal_json(&profile).unwrap();
        let opened: TravelerProfile = enc.open_json(&sealed).unwrap();
        assert_eq!(opened, profile);
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = encryptor().seal(b"secret").unwrap();
        assert!(matches!(
            encryptor().open(&sealed),
            Err(AppError::Encryption(_))
        ));
    }

    #[test]
    fn test_invalid_keys() {
        assert!(matches!(
            Encryptor::from_bytes(&[0u8; 16]),
            Err(AppError::Config(_))
        ));
        assert!(Encryptor::from_base64("not-valid-base64!!!").is_err());
    }

    #[test]
    fn test_tampered_data_fails() {
        let enc = encryptor();
        let mut sealed = enc.seal(b"secret").unwrap();
        if let Some(byte) = sealed.last_mut() {
            *byte ^= 0xFF;
        }
        assert!(enc.open(&sealed).is_err());
        assert!(enc.open(&[1, 2, 3]).is_err());
    }
}
