use chrono::Utc;
use log::info;
use thiserror::Error;

use std::sync::{Arc, Mutex};

use super::block::Block;
use super::crypto::Address;
use super::pow::{self, PowError};
use super::transaction::{Transaction, TransactionError};

/// Sentinel previous-hash of the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Address credited by the genesis block's zero-value issuance
pub const GENESIS_ADDRESS: &str = "genesis-address";

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Proof-of-work error: {0}")]
    PowError(#[from] PowError),

    #[error("Chain is empty; genesis initialization was bypassed or chain state is corrupted")]
    EmptyChain,
}

/// Caller-owned ledger parameters
///
/// Replaces the original driver's top-level globals: difficulty and
/// reward belong to whoever constructs the chain, not to the process.
#[derive(Debug, Clone, Copy)]
pub struct ChainConfig {
    /// Required leading zero bits in every sealed block's hash
    pub difficulty: u32,

    /// Amount credited to the miner per sealed block
    pub mining_reward: f64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            difficulty: 2,
            mining_reward: 50.0,
        }
    }
}

/// Represents the blockchain
///
/// Owns the block sequence and the pending transaction pool. The
/// chain grows only by [`Blockchain::mine_pending_transactions`];
/// blocks are never reordered or truncated.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks
    chain: Arc<Mutex<Vec<Block>>>,

    /// Pending transactions to be included in the next block
    pending_transactions: Arc<Mutex<Vec<Transaction>>>,

    /// Ledger parameters
    config: ChainConfig,
}

impl Blockchain {
    /// Creates a new blockchain with a genesis block and default
    /// parameters
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    /// Creates a new blockchain with a genesis block
    ///
    /// # Arguments
    ///
    /// * `config` - The difficulty and mining-reward parameters
    ///
    /// # Returns
    ///
    /// A new Blockchain instance
    pub fn with_config(config: ChainConfig) -> Self {
        let blockchain = Blockchain {
            chain: Arc::new(Mutex::new(Vec::new())),
            pending_transactions: Arc::new(Mutex::new(Vec::new())),
            config,
        };

        blockchain.create_genesis_block();
        blockchain
    }

    /// Creates the genesis block (first block in the chain)
    ///
    /// The genesis block issues zero value to the fixed genesis
    /// address and is not mined.
    fn create_genesis_block(&self) {
        let issuance = Transaction::new_reward(Address(GENESIS_ADDRESS.to_string()), 0.0);

        let genesis_block = Block::new(
            Utc::now().timestamp_millis(),
            vec![issuance],
            GENESIS_PREVIOUS_HASH.to_string(),
            self.config.difficulty,
        );

        self.chain.lock().unwrap().push(genesis_block);
    }

    /// Gets the last block in the chain
    ///
    /// # Returns
    ///
    /// The last block, or `EmptyChain` if the chain somehow has no
    /// blocks (genesis initialization makes that unreachable)
    pub fn latest_block(&self) -> Result<Block, BlockchainError> {
        let chain = self.chain.lock().unwrap();
        chain.last().cloned().ok_or(BlockchainError::EmptyChain)
    }

    /// Adds a transaction to the pending pool
    ///
    /// A malformed transaction is rejected and the pool is left
    /// unchanged.
    ///
    /// # Arguments
    ///
    /// * `transaction` - The transaction to add
    ///
    /// # Returns
    ///
    /// Ok(()) if the transaction was accepted
    pub fn add_transaction(&self, transaction: Transaction) -> Result<(), BlockchainError> {
        transaction.validate()?;

        self.pending_transactions.lock().unwrap().push(transaction);
        Ok(())
    }

    /// Mines the pending transactions into a new block
    ///
    /// Builds a block on top of the latest hash, seals it with
    /// proof-of-work and appends it. The pending pool is taken and
    /// reseeded with a single reward transaction in one step, so no
    /// transaction can be double-included or lost between calls.
    ///
    /// # Arguments
    ///
    /// * `reward_address` - The miner's address, credited by the next
    ///   block's reward transaction
    ///
    /// # Returns
    ///
    /// The newly sealed block
    pub fn mine_pending_transactions(
        &self,
        reward_address: &Address,
    ) -> Result<Block, BlockchainError> {
        // A difficulty the digest can never satisfy must fail here,
        // before the pool is touched or a search started.
        pow::check_difficulty(self.config.difficulty)?;

        let previous_hash = self.latest_block()?.hash;

        // Atomically take the pool and reseed it with the reward.
        let reward = Transaction::new_reward(reward_address.clone(), self.config.mining_reward);
        let transactions = {
            let mut pending = self.pending_transactions.lock().unwrap();
            std::mem::replace(&mut *pending, vec![reward])
        };

        let mut block = Block::new(
            Utc::now().timestamp_millis(),
            transactions,
            previous_hash,
            self.config.difficulty,
        );

        info!(
            "Mining block {} with difficulty {}...",
            self.chain.lock().unwrap().len(),
            block.difficulty
        );

        block.mine()?;

        info!("Block mined: {}", block.hash);

        self.chain.lock().unwrap().push(block.clone());
        Ok(block)
    }

    /// Computes the balance of an address by scanning every block
    ///
    /// Sent amounts are subtracted, received amounts added. Issuance
    /// transactions only ever add. Nothing stops a balance from going
    /// negative; spending validation is out of scope.
    ///
    /// # Arguments
    ///
    /// * `address` - The address to compute the balance for
    ///
    /// # Returns
    ///
    /// The signed balance total
    pub fn balance_of(&self, address: &Address) -> f64 {
        let chain = self.chain.lock().unwrap();
        let mut balance = 0.0;

        for block in chain.iter() {
            for transaction in &block.transactions {
                if transaction.sender.as_ref() == Some(address) {
                    balance -= transaction.amount;
                }
                if transaction.recipient == *address {
                    balance += transaction.amount;
                }
            }
        }

        balance
    }

    /// Validates the blockchain
    ///
    /// For every block after genesis this re-derives the digest from
    /// the block's content, checks the link to the previous block's
    /// stored hash, and re-applies the difficulty check. Any mutation
    /// of an appended block flips the result to false.
    ///
    /// # Returns
    ///
    /// true if the blockchain is valid, false otherwise
    pub fn is_valid(&self) -> bool {
        let chain = self.chain.lock().unwrap();

        for i in 1..chain.len() {
            let current_block = &chain[i];
            let previous_block = &chain[i - 1];

            // Check if the stored hash still matches the content
            if current_block.hash != current_block.calculate_hash() {
                return false;
            }

            // Check if the link to the previous block is intact
            if current_block.previous_hash != previous_block.hash {
                return false;
            }

            // Check if the block was honestly mined
            if !pow::hash_matches_difficulty(&current_block.hash, current_block.difficulty) {
                return false;
            }
        }

        true
    }

    /// Gets the entire blockchain
    ///
    /// # Returns
    ///
    /// A vector of all blocks in the chain
    pub fn get_chain(&self) -> Vec<Block> {
        self.chain.lock().unwrap().clone()
    }

    /// Gets all pending transactions
    ///
    /// # Returns
    ///
    /// A vector of all pending transactions
    pub fn get_pending_transactions(&self) -> Vec<Transaction> {
        self.pending_transactions.lock().unwrap().clone()
    }

    /// Gets the ledger parameters
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}
