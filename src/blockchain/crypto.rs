use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

use super::transaction::Transaction;

/// Byte length of the AES-GCM nonce prepended to encrypted payloads
const AES_NONCE_LEN: usize = 12;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Failed to encrypt transaction: {0}")]
    EncryptionError(String),

    #[error("Failed to decrypt transaction: {0}")]
    DecryptionError(String),
}

/// Represents an address used as a transaction endpoint
///
/// The ledger treats addresses as opaque strings; wallet-derived
/// addresses happen to be base58-encoded public keys, but nothing in
/// the chain depends on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Creates a new address from a public key
    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        let encoded = bs58::encode(public_key.as_bytes()).into_string();
        Address(encoded)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Address(s.to_string()))
    }
}

/// Represents a wallet identity with a keypair
///
/// The wallet only supplies addresses; the ledger performs no
/// signature verification on ingested transactions.
#[derive(Debug, Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Creates a new wallet with a random keypair
    pub fn new() -> Self {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = Address::from_public_key(&verifying_key);

        Wallet {
            signing_key,
            address,
        }
    }

    /// Creates a wallet from an existing secret key
    pub fn from_secret_key(secret_key_bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_array: [u8; 32] = secret_key_bytes.try_into().map_err(|_| {
            CryptoError::InvalidPrivateKey("Invalid private key length".to_string())
        })?;

        let signing_key = SigningKey::from_bytes(&bytes_array);
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = Address::from_public_key(&verifying_key);

        Ok(Wallet {
            signing_key,
            address,
        })
    }

    /// Gets the wallet's address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Exports the wallet's secret key as bytes
    pub fn export_secret_key(&self) -> Vec<u8> {
        self.signing_key.to_bytes().to_vec()
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives an AES-256 key from a shared passphrase
fn derive_key(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

/// Encrypts a transaction for transport between parties
///
/// AES-256-GCM keyed by the SHA-256 of the passphrase; a random
/// 96-bit nonce is prepended to the ciphertext and the whole payload
/// is base64-encoded.
///
/// # Arguments
///
/// * `transaction` - The transaction to encrypt
/// * `secret` - The shared passphrase
///
/// # Returns
///
/// The base64 payload, or an error if encryption fails
pub fn encrypt_transaction(
    transaction: &Transaction,
    secret: &str,
) -> Result<String, CryptoError> {
    let key = derive_key(secret);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    let plaintext = serde_json::to_vec(transaction)
        .map_err(|e| CryptoError::EncodingError(e.to_string()))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_ref())
        .map_err(|e| CryptoError::EncryptionError(e.to_string()))?;

    let mut payload = nonce.to_vec();
    payload.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(payload))
}

/// Decrypts a transaction received from another party
///
/// Any failure (bad base64, truncated payload, wrong passphrase,
/// unparsable plaintext) surfaces as an error so the caller can
/// reject the ingestion; a garbled payload never turns into an empty
/// transaction.
///
/// # Arguments
///
/// * `payload` - The base64 payload produced by [`encrypt_transaction`]
/// * `secret` - The shared passphrase
///
/// # Returns
///
/// The decrypted transaction, or an error describing the failure
pub fn decrypt_transaction(payload: &str, secret: &str) -> Result<Transaction, CryptoError> {
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| CryptoError::DecodingError(e.to_string()))?;

    if bytes.len() <= AES_NONCE_LEN {
        return Err(CryptoError::DecryptionError(
            "Payload too short to contain a nonce".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext) = bytes.split_at(AES_NONCE_LEN);

    let key = derive_key(secret);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::DecryptionError("Authentication failed".to_string()))?;

    serde_json::from_slice(&plaintext)
        .map_err(|e| CryptoError::DecryptionError(e.to_string()))
}
