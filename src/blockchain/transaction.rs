use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::crypto::Address;

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Missing recipient address")]
    MissingRecipient,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Represents a value transfer in the ledger
///
/// A transaction with no sender is an issuance: either the genesis
/// allocation or a mining reward. Issuance only ever credits the
/// recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's address (None for genesis and reward issuance)
    pub sender: Option<Address>,

    /// Recipient's address
    pub recipient: Address,

    /// Amount being transferred
    pub amount: f64,
}

impl Transaction {
    /// Creates a new transfer transaction
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer
    ///
    /// # Returns
    ///
    /// A new Transaction instance
    pub fn new(sender: Address, recipient: Address, amount: f64) -> Self {
        Transaction {
            sender: Some(sender),
            recipient,
            amount,
        }
    }

    /// Creates a new reward transaction crediting a miner
    ///
    /// # Arguments
    ///
    /// * `recipient` - The address of the miner
    /// * `amount` - The reward amount
    ///
    /// # Returns
    ///
    /// A new Transaction instance with no sender
    pub fn new_reward(recipient: Address, amount: f64) -> Self {
        Transaction {
            sender: None,
            recipient,
            amount,
        }
    }

    /// Checks whether the transaction is an issuance (genesis or reward)
    pub fn is_issuance(&self) -> bool {
        self.sender.is_none()
    }

    /// Validates the transaction at ingestion time
    ///
    /// # Returns
    ///
    /// Ok(()) if well-formed, an error describing the malformed field
    /// otherwise
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.recipient.0.is_empty() {
            return Err(TransactionError::MissingRecipient);
        }

        if !self.amount.is_finite() {
            return Err(TransactionError::InvalidAmount(format!(
                "amount must be a finite number, got {}",
                self.amount
            )));
        }

        if self.amount < 0.0 {
            return Err(TransactionError::InvalidAmount(format!(
                "amount must be non-negative, got {}",
                self.amount
            )));
        }

        Ok(())
    }
}

/// Serializes an ordered transaction list into its canonical form
///
/// The same sequence of transactions always produces the same string,
/// and reordering the sequence changes it. Block digests are computed
/// over this form, so re-validation re-derives identical hashes.
pub fn serialize_transactions(transactions: &[Transaction]) -> String {
    // Field order is fixed by the struct definition; serde_json
    // preserves it, which makes the output canonical.
    serde_json::to_string(transactions).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction() {
        let transaction = Transaction::new(
            Address("alice".to_string()),
            Address("bob".to_string()),
            10.5,
        );

        assert_eq!(transaction.sender, Some(Address("alice".to_string())));
        assert_eq!(transaction.recipient, Address("bob".to_string()));
        assert_eq!(transaction.amount, 10.5);
        assert!(!transaction.is_issuance());
        assert!(transaction.validate().is_ok());
    }

    #[test]
    fn test_reward_transaction() {
        let transaction = Transaction::new_reward(Address("miner".to_string()), 50.0);

        assert!(transaction.sender.is_none());
        assert!(transaction.is_issuance());
        assert_eq!(transaction.amount, 50.0);
        assert!(transaction.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_recipient() {
        let transaction = Transaction::new(
            Address("alice".to_string()),
            Address(String::new()),
            1.0,
        );

        assert!(matches!(
            transaction.validate(),
            Err(TransactionError::MissingRecipient)
        ));
    }

    #[test]
    fn test_validate_rejects_negative_amount() {
        let transaction = Transaction::new(
            Address("alice".to_string()),
            Address("bob".to_string()),
            -1.0,
        );

        assert!(matches!(
            transaction.validate(),
            Err(TransactionError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_finite_amount() {
        let transaction = Transaction::new(
            Address("alice".to_string()),
            Address("bob".to_string()),
            f64::NAN,
        );

        assert!(matches!(
            transaction.validate(),
            Err(TransactionError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_serialization_is_canonical() {
        let a = Transaction::new(Address("a".to_string()), Address("b".to_string()), 5.0);
        let b = Transaction::new_reward(Address("m".to_string()), 50.0);

        let first = serialize_transactions(&[a.clone(), b.clone()]);
        let second = serialize_transactions(&[a.clone(), b.clone()]);
        assert_eq!(first, second);

        // Order must affect the serialization
        let reordered = serialize_transactions(&[b, a]);
        assert_ne!(first, reordered);
    }
}
