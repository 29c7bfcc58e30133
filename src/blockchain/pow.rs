use thiserror::Error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::block::Block;

/// Bit width of a SHA-256 digest
pub const DIGEST_BITS: u32 = 256;

/// Errors that can occur during the proof-of-work search
#[derive(Debug, Error)]
pub enum PowError {
    #[error("Difficulty {difficulty} requires more leading zero bits than the digest has ({max}); the search would never terminate")]
    DifficultyMisconfiguration { difficulty: u32, max: u32 },

    #[error("Nonce search was cancelled")]
    Cancelled,
}

/// Cooperative cancellation flag for the nonce search
///
/// Cloned tokens share the same flag, so one clone can be handed to
/// the search while another stays with the caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a new, untripped token
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of any search holding this token
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Checks whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Rejects difficulties the digest can never satisfy
///
/// Must be called before starting a search; a difficulty of 256 or
/// more would loop forever rather than fail.
pub fn check_difficulty(difficulty: u32) -> Result<(), PowError> {
    if difficulty >= DIGEST_BITS {
        return Err(PowError::DifficultyMisconfiguration {
            difficulty,
            max: DIGEST_BITS - 1,
        });
    }

    Ok(())
}

/// Tests whether a hex digest starts with `difficulty` zero bits
///
/// The digest is interpreted at its full 256-bit width, so leading
/// zero bits are never lost the way a plain integer conversion would
/// lose them. A difficulty of 0 always qualifies; a malformed digest
/// never does.
pub fn hash_matches_difficulty(hash_hex: &str, difficulty: u32) -> bool {
    let bytes = match hex::decode(hash_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    count_leading_zero_bits(&bytes) >= difficulty
}

/// Counts the leading zero bits of a digest
fn count_leading_zero_bits(bytes: &[u8]) -> u32 {
    let mut count = 0;
    for &byte in bytes {
        if byte == 0 {
            count += 8;
        } else {
            count += byte.leading_zeros();
            break;
        }
    }
    count
}

/// Searches for a nonce whose digest satisfies the block's difficulty
///
/// Starts at nonce 0 and recomputes the full digest on every attempt;
/// the first qualifying nonce wins. Without a cancel token the search
/// is unbounded. The block itself is not modified; the caller installs
/// the returned (nonce, hash) pair.
///
/// # Arguments
///
/// * `block` - The block whose content is being sealed
/// * `cancel` - Optional cancellation token checked on each attempt
///
/// # Returns
///
/// The winning nonce and its digest, or an error if the difficulty is
/// misconfigured or the search was cancelled
pub fn find_block_nonce(
    block: &Block,
    cancel: Option<&CancelToken>,
) -> Result<(u64, String), PowError> {
    check_difficulty(block.difficulty)?;

    let mut nonce: u64 = 0;
    loop {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(PowError::Cancelled);
            }
        }

        let hash = block.hash_with_nonce(nonce);
        if hash_matches_difficulty(&hash, block.difficulty) {
            return Ok((nonce, hash));
        }

        nonce += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::Address;
    use crate::blockchain::transaction::Transaction;

    fn sample_block(difficulty: u32) -> Block {
        let transactions = vec![Transaction::new(
            Address("alice".to_string()),
            Address("bob".to_string()),
            5.0,
        )];
        Block::new(1_700_000_000_000, transactions, "0".to_string(), difficulty)
    }

    #[test]
    fn test_zero_difficulty_always_qualifies() {
        assert!(hash_matches_difficulty(&"f".repeat(64), 0));
        assert!(hash_matches_difficulty(&"0".repeat(64), 0));
    }

    #[test]
    fn test_leading_zero_bits() {
        // 0f... = 00001111 -> exactly 4 leading zero bits
        let hash = format!("0f{}", "f".repeat(62));
        assert!(hash_matches_difficulty(&hash, 4));
        assert!(!hash_matches_difficulty(&hash, 5));

        // 00 80... -> exactly 8 leading zero bits
        let hash = format!("0080{}", "f".repeat(60));
        assert!(hash_matches_difficulty(&hash, 8));
        assert!(!hash_matches_difficulty(&hash, 9));

        // All-zero digest satisfies the maximum
        assert!(hash_matches_difficulty(&"0".repeat(64), 256));
    }

    #[test]
    fn test_malformed_digest_never_qualifies() {
        assert!(!hash_matches_difficulty("not hex", 1));
    }

    #[test]
    fn test_check_difficulty_rejects_digest_width() {
        assert!(check_difficulty(0).is_ok());
        assert!(check_difficulty(255).is_ok());

        assert!(matches!(
            check_difficulty(256),
            Err(PowError::DifficultyMisconfiguration { difficulty: 256, .. })
        ));
        assert!(matches!(
            check_difficulty(300),
            Err(PowError::DifficultyMisconfiguration { .. })
        ));
    }

    #[test]
    fn test_find_block_nonce_satisfies_difficulty() {
        let block = sample_block(4);
        let (nonce, hash) = find_block_nonce(&block, None).unwrap();

        assert!(hash_matches_difficulty(&hash, 4));
        assert_eq!(block.hash_with_nonce(nonce), hash);
    }

    #[test]
    fn test_find_block_nonce_rejects_misconfiguration() {
        let block = sample_block(256);
        assert!(matches!(
            find_block_nonce(&block, None),
            Err(PowError::DifficultyMisconfiguration { .. })
        ));
    }

    #[test]
    fn test_find_block_nonce_honours_cancellation() {
        // A pre-tripped token must stop the search on the first
        // attempt, even at a difficulty that would take a long time.
        let block = sample_block(255);
        let token = CancelToken::new();
        token.cancel();

        assert!(matches!(
            find_block_nonce(&block, Some(&token)),
            Err(PowError::Cancelled)
        ));
    }
}
