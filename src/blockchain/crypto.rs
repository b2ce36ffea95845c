use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Shared secp256k1 context, built once on first use
static SECP256K1: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Errors that can occur while decoding a key or signature for verification
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

/// Errors that can occur while loading a key pair
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
}

/// Hashes arbitrary bytes with SHA-256
///
/// # Returns
///
/// The digest as a 64 character lowercase hexadecimal string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// ECDSA signs the SHA-256 digest of `message`
pub fn sign_message(secret_key: &SecretKey, message: &[u8]) -> [u8; COMPACT_SIGNATURE_SIZE] {
    let digest: [u8; 32] = Sha256::digest(message).into();
    let message = Message::from_digest(digest);
    SECP256K1.sign_ecdsa(&message, secret_key).serialize_compact()
}

/// Verifies a compact ECDSA signature against a message and a compressed public key
///
/// # Arguments
///
/// * `public_key_bytes` - The 33 byte compressed public key
/// * `message` - The signed message (hashed with SHA-256 before verification)
/// * `signature_bytes` - The 64 byte compact signature
///
/// # Returns
///
/// `Ok(true)` if the signature matches, `Ok(false)` if it is well formed but does not,
/// and an error if the key or signature cannot be decoded
pub fn verify_signature(
    public_key_bytes: &[u8],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, CryptoError> {
    if public_key_bytes.len() != PUBLIC_KEY_SIZE {
        return Err(CryptoError::InvalidPublicKey(format!(
            "expected {} bytes, got {}",
            PUBLIC_KEY_SIZE,
            public_key_bytes.len()
        )));
    }
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(CryptoError::InvalidSignature(format!(
            "expected {} bytes, got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let public_key = PublicKey::from_slice(public_key_bytes)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    let signature = Signature::from_compact(signature_bytes)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let digest: [u8; 32] = Sha256::digest(message).into();
    let message = Message::from_digest(digest);

    Ok(SECP256K1.verify_ecdsa(&message, &signature, &public_key).is_ok())
}

/// A secp256k1 key pair held by a transaction sender
#[derive(Debug, Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Creates a new key pair from the OS random number generator
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    /// Creates a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a key pair from raw secret key bytes
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(KeyError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                SECRET_KEY_SIZE,
                bytes.len()
            )));
        }

        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;

        Ok(Self::from_secret_key(secret_key))
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Hex encoding of the compressed public key
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; COMPACT_SIGNATURE_SIZE] {
        sign_message(&self.secret_key, message)
    }
}
