//! An educational proof-of-work ledger.
//!
//! Blocks hold batches of value-transfer transactions, link to each
//! other by SHA-256 digest and are sealed by a leading-zero-bit
//! proof-of-work puzzle. The [`blockchain`] module exposes the chain,
//! its blocks and the wallet/transport helpers used by the demo
//! driver.

pub mod blockchain;

pub use blockchain::{Address, Block, Blockchain, BlockchainError, ChainConfig, Transaction, Wallet};
