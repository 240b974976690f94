use std::path::Path;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Context, Result};
use rand::Rng;
use sha2::{Digest, Sha256};

const KEY_ENV_VAR: &str = "FLOWFORGE_SECRET_KEY";
const PASSPHRASE_ENV_VAR: &str = "FLOWFORGE_SECRET_PASSPHRASE";

pub type SecretKey = [u8; 32];

/// Derive a key from a passphrase.
pub fn key_from_passphrase(passphrase: &str) -> SecretKey {
    let digest = Sha256::digest(passphrase.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

fn decode_key(key_hex: &str) -> Option<SecretKey> {
    let bytes = hex::decode(key_hex.trim()).ok()?;
    bytes.try_into().ok()
}

/// Get or create the encryption key.
/// Priority: passphrase env var, hex key env var, key file, otherwise a freshly
/// generated key that is written to `key_file`.
pub fn resolve_key(key_file: &Path) -> Result<SecretKey> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV_VAR) {
        if !passphrase.is_empty() {
            return Ok(key_from_passphrase(&passphrase));
        }
    }
    if let Ok(key_hex) = std::env::var(KEY_ENV_VAR) {
        if let Some(key) = decode_key(&key_hex) {
            return Ok(key);
        }
        log::warn!("{KEY_ENV_VAR} is not a 32-byte hex key, ignoring");
    }
    load_or_create_key_file(key_file)
}

pub fn load_or_create_key_file(key_file: &Path) -> Result<SecretKey> {
    if key_file.exists() {
        let content = std::fs::read_to_string(key_file)
            .with_context(|| format!("Failed to read key file {}", key_file.display()))?;
        return decode_key(&content)
            .ok_or_else(|| anyhow!("Invalid key file {}", key_file.display()));
    }

    let key: SecretKey = rand::thread_rng().gen();
    if let Some(parent) = key_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(key_file, hex::encode(key))
        .with_context(|| format!("Failed to write key file {}", key_file.display()))?;
    log::info!("Generated new secret key at {}", key_file.display());
    Ok(key)
}

/// Encrypt data
/// Returns: hex(nonce) + ":" + hex(ciphertext)
pub fn encrypt(plaintext: &str, key: &SecretKey) -> Result<String> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {e}"))?;

    let nonce_bytes: [u8; 12] = rand::thread_rng().gen();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {e}"))?;

    Ok(format!("{}:{}", hex::encode(nonce_bytes), hex::encode(ciphertext)))
}

/// Decrypt data
pub fn decrypt(encrypted: &str, key: &SecretKey) -> Result<String> {
    let (nonce_hex, ciphertext_hex) = encrypted
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid encrypted format"))?;

    let nonce_bytes = hex::decode(nonce_hex).map_err(|e| anyhow!("Invalid nonce: {e}"))?;
    if nonce_bytes.len() != 12 {
        return Err(anyhow!("Invalid nonce length"));
    }
    let ciphertext = hex::decode(ciphertext_hex).map_err(|e| anyhow!("Invalid ciphertext: {e}"))?;

    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {e}"))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|e| anyhow!("Decryption failed: {e}"))?;

    String::from_utf8(plaintext).map_err(|e| anyhow!("Invalid UTF-8: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = key_from_passphrase("correct horse");
        let plaintext = "ghp_secret_token";
        let encrypted = encrypt(plaintext, &key).unwrap();
        assert_ne!(encrypted, plaintext);
        let decrypted = decrypt(&encrypted, &key).unwrap();
        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let encrypted = encrypt("token", &key_from_passphrase("a")).unwrap();
        assert!(decrypt(&encrypted, &key_from_passphrase("b")).is_err());
    }

    #[test]
    fn test_decrypt_rejects_garbage() {
        let key = key_from_passphrase("a");
        assert!(decrypt("not-encrypted", &key).is_err());
        assert!(decrypt("zz:zz", &key).is_err());
    }

    #[test]
    fn test_key_file_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("secret.key");

        let first = load_or_create_key_file(&path).unwrap();
        let second = load_or_create_key_file(&path).unwrap();
        assert_eq!(first, second);
    }
}
