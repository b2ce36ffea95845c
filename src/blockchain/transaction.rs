use log::debug;
use secp256k1::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::crypto::{sign_message, verify_signature, CryptoError};

/// Reasons a transaction fails verification
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Malformed hex in {field}: {reason}")]
    MalformedHex { field: &'static str, reason: String },

    #[error("Invalid sender public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("Signature does not match transaction contents")]
    SignatureMismatch,
}

impl From<CryptoError> for TransactionError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidPublicKey(msg) => TransactionError::InvalidPublicKey(msg),
            CryptoError::InvalidSignature(msg) => TransactionError::InvalidSignature(msg),
        }
    }
}

/// A signed value transfer
///
/// The signature covers the message `"<sender>-><receiver>:<amount>"`, so changing any
/// of those fields after signing makes [`Transaction::verify`] fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hex encoded compressed public key of the sender
    pub sender: String,

    /// Opaque identifier of the receiver
    pub receiver: String,

    /// Amount being transferred
    pub amount: u64,

    /// Hex encoded compact ECDSA signature
    pub signature: String,
}

impl Transaction {
    /// Creates and signs a new transaction
    ///
    /// # Arguments
    ///
    /// * `private_key` - The sender's secret key, used for signing
    /// * `public_key` - The sender's public key, recorded as the sender
    /// * `receiver` - Identifier of the receiver
    /// * `amount` - The amount to transfer
    ///
    /// # Returns
    ///
    /// A new signed Transaction instance
    pub fn new(
        private_key: &SecretKey,
        public_key: &PublicKey,
        receiver: impl Into<String>,
        amount: u64,
    ) -> Self {
        let sender = hex::encode(public_key.serialize());
        let receiver = receiver.into();
        let message = signing_message(&sender, &receiver, amount);
        let signature = hex::encode(sign_message(private_key, message.as_bytes()));

        debug!("Signed transaction {} -> {}: {}", short(&sender), receiver, amount);

        Transaction {
            sender,
            receiver,
            amount,
            signature,
        }
    }

    /// The exact message the signature is computed over
    pub fn message(&self) -> String {
        signing_message(&self.sender, &self.receiver, self.amount)
    }

    /// Verifies the transaction's signature against its own fields
    ///
    /// # Returns
    ///
    /// `Ok(())` if the signature is authentic, otherwise the reason it was rejected
    pub fn verify(&self) -> Result<(), TransactionError> {
        if self.sender.is_empty() {
            return Err(TransactionError::MissingField("sender"));
        }
        if self.signature.is_empty() {
            return Err(TransactionError::MissingField("signature"));
        }

        let public_key = hex::decode(&self.sender).map_err(|e| TransactionError::MalformedHex {
            field: "sender",
            reason: e.to_string(),
        })?;
        let signature =
            hex::decode(&self.signature).map_err(|e| TransactionError::MalformedHex {
                field: "signature",
                reason: e.to_string(),
            })?;

        if verify_signature(&public_key, self.message().as_bytes(), &signature)? {
            Ok(())
        } else {
            Err(TransactionError::SignatureMismatch)
        }
    }
}

/// Creates and signs a transaction, see [`Transaction::new`]
pub fn create_transaction(
    private_key: &SecretKey,
    public_key: &PublicKey,
    receiver: impl Into<String>,
    amount: u64,
) -> Transaction {
    Transaction::new(private_key, public_key, receiver, amount)
}

/// Returns true if the transaction is well formed and authentically signed
pub fn verify_transaction(transaction: &Transaction) -> bool {
    transaction.verify().is_ok()
}

fn signing_message(sender: &str, receiver: &str, amount: u64) -> String {
    format!("{}->{}:{}", sender, receiver, amount)
}

pub(crate) fn short(hex: &str) -> &str {
    hex.get(..8).unwrap_or(hex)
}
