// Blockchain module
//
// This module contains the core ledger implementation including:
// - Block structure and hash computation
// - Proof-of-work search and difficulty check
// - Transaction structure and ingestion validation
// - Blockchain structure, balances and chain validation
// - Wallet key generation and transport encryption

pub mod block;
pub mod chain;
pub mod crypto;
pub mod pow;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, BlockchainError, ChainConfig};
pub use crypto::{Address, Wallet};
pub use pow::{CancelToken, PowError};
pub use transaction::Transaction;
