use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::pow::{self, PowError};
use super::transaction::{serialize_transactions, Transaction};

/// Represents a block in the ledger
///
/// A block is created unsealed (nonce 0, hash computed over the
/// initial state) and sealed in place by [`Block::mine`]. Once it has
/// been appended to the chain it is logically frozen; any later
/// mutation is caught by chain validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Timestamp when the block was assembled (milliseconds since epoch)
    pub timestamp: i64,

    /// Ordered list of transactions included in this block
    pub transactions: Vec<Transaction>,

    /// Hash of the previous block (the genesis sentinel for block 0)
    pub previous_hash: String,

    /// Hash of the current block's content
    pub hash: String,

    /// Nonce found by the proof-of-work search
    pub nonce: u64,

    /// Difficulty target this block was sealed against
    pub difficulty: u32,
}

impl Block {
    /// Creates a new unsealed block
    ///
    /// # Arguments
    ///
    /// * `timestamp` - Assembly time in milliseconds since the epoch
    /// * `transactions` - The ordered transactions to include
    /// * `previous_hash` - The hash of the preceding block
    /// * `difficulty` - The proof-of-work target for sealing
    ///
    /// # Returns
    ///
    /// A new Block with nonce 0 and its hash already computed
    pub fn new(
        timestamp: i64,
        transactions: Vec<Transaction>,
        previous_hash: String,
        difficulty: u32,
    ) -> Self {
        let mut block = Block {
            timestamp,
            transactions,
            previous_hash,
            hash: String::new(),
            nonce: 0,
            difficulty,
        };

        block.hash = block.calculate_hash();
        block
    }

    /// Calculates the hash of the block's current content
    ///
    /// Pure function of the block's fields: the same block always
    /// hashes to the same digest, during sealing or long after.
    ///
    /// # Returns
    ///
    /// The SHA-256 digest as a 64-character lowercase hex string
    pub fn calculate_hash(&self) -> String {
        self.hash_with_nonce(self.nonce)
    }

    /// Calculates the block's hash as if its nonce were `nonce`
    ///
    /// Numeric fields are fed to the hasher at explicit width
    /// (big-endian), and the transaction list through its canonical
    /// serialization, so equal content can never diverge into
    /// different digests.
    pub fn hash_with_nonce(&self, nonce: u64) -> String {
        let mut hasher = Sha256::new();

        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(serialize_transactions(&self.transactions).as_bytes());
        hasher.update(nonce.to_be_bytes());

        format!("{:x}", hasher.finalize())
    }

    /// Seals the block by running the proof-of-work search
    ///
    /// On success the block's nonce and hash hold the winning pair;
    /// no intermediate state is observable. The difficulty is checked
    /// before the search starts, so a misconfigured target fails fast
    /// instead of hanging.
    ///
    /// # Returns
    ///
    /// Ok(()) once sealed, or the search error
    pub fn mine(&mut self) -> Result<(), PowError> {
        let (nonce, hash) = pow::find_block_nonce(self, None)?;

        self.nonce = nonce;
        self.hash = hash;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::Address;
    use crate::blockchain::pow::hash_matches_difficulty;

    fn sample_transactions() -> Vec<Transaction> {
        vec![
            Transaction::new(Address("alice".to_string()), Address("bob".to_string()), 5.0),
            Transaction::new_reward(Address("miner".to_string()), 50.0),
        ]
    }

    #[test]
    fn test_new_block() {
        let block = Block::new(1_700_000_000_000, sample_transactions(), "0".to_string(), 2);

        assert_eq!(block.nonce, 0);
        assert_eq!(block.previous_hash, "0");
        assert_eq!(block.hash.len(), 64);
        assert_eq!(block.hash, block.calculate_hash());
    }

    #[test]
    fn test_calculate_hash_is_idempotent() {
        let block = Block::new(1_700_000_000_000, sample_transactions(), "0".to_string(), 2);

        assert_eq!(block.calculate_hash(), block.calculate_hash());
    }

    #[test]
    fn test_hash_depends_on_every_field() {
        let block = Block::new(1_700_000_000_000, sample_transactions(), "0".to_string(), 2);
        let base = block.calculate_hash();

        let mut changed = block.clone();
        changed.timestamp += 1;
        assert_ne!(changed.calculate_hash(), base);

        let mut changed = block.clone();
        changed.previous_hash = "1".to_string();
        assert_ne!(changed.calculate_hash(), base);

        let mut changed = block.clone();
        changed.transactions[0].amount = 6.0;
        assert_ne!(changed.calculate_hash(), base);

        assert_ne!(block.hash_with_nonce(1), base);
    }

    #[test]
    fn test_mine_seals_block() {
        let mut block = Block::new(1_700_000_000_000, sample_transactions(), "0".to_string(), 4);
        block.mine().unwrap();

        assert_eq!(block.hash, block.calculate_hash());
        assert!(hash_matches_difficulty(&block.hash, block.difficulty));
    }
}
