use log::{error, info};

use gigacoin::blockchain::crypto::{decrypt_transaction, encrypt_transaction};
use gigacoin::{Blockchain, ChainConfig, Transaction, Wallet};

/// Logs a wallet's address and exported secret key
fn report_wallet(name: &str, wallet: &Wallet) {
    info!(
        "{}: address={} secret_key={}",
        name,
        wallet.address(),
        hex::encode(wallet.export_secret_key())
    );
}

/// Logs every block in the chain with its transactions
fn report_chain(blockchain: &Blockchain) {
    info!("Blockchain data:");
    for (index, block) in blockchain.get_chain().iter().enumerate() {
        info!("Block {}:", index);
        info!("  Timestamp: {}", block.timestamp);
        info!("  Previous hash: {}", block.previous_hash);
        info!("  Hash: {}", block.hash);
        info!("  Nonce: {}", block.nonce);
        info!("  Transactions:");
        for tx in &block.transactions {
            let sender = tx
                .sender
                .as_ref()
                .map(|address| address.to_string())
                .unwrap_or_else(|| "(issuance)".to_string());
            info!("    {} -> {}: {}", sender, tx.recipient, tx.amount);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Identities are plain keypairs; the ledger only sees addresses
    let user1 = Wallet::new();
    let user2 = Wallet::new();
    let miner = Wallet::new();

    report_wallet("User 1", &user1);
    report_wallet("User 2", &user2);
    report_wallet("Miner", &miner);

    let gigacoin = Blockchain::with_config(ChainConfig::default());

    // Transport the transaction between parties in encrypted form
    let secret = "dromadaireSelimKaan5A";
    let transaction = Transaction::new(user1.address().clone(), user2.address().clone(), 57.0);

    let payload = encrypt_transaction(&transaction, secret)?;
    info!("Encrypted transaction data: {}", payload);

    match decrypt_transaction(&payload, secret) {
        Ok(decrypted) => {
            info!(
                "Decrypted transaction data: {} -> {}: {}",
                decrypted.sender.as_ref().map(|a| a.to_string()).unwrap_or_default(),
                decrypted.recipient,
                decrypted.amount
            );
            gigacoin.add_transaction(decrypted)?;
        }
        Err(err) => {
            error!("Error while decrypting the transaction: {}", err);
        }
    }

    info!("Starting the miner...");
    gigacoin.mine_pending_transactions(miner.address())?;

    info!("Balance of User 1 is {}", gigacoin.balance_of(user1.address()));
    info!("Balance of User 2 is {}", gigacoin.balance_of(user2.address()));
    info!("Balance of miner is {}", gigacoin.balance_of(miner.address()));
    info!("Is the chain valid? {}", gigacoin.is_valid());

    info!("Starting the miner again...");
    gigacoin.mine_pending_transactions(miner.address())?;

    info!("Balance of User 1 is {}", gigacoin.balance_of(user1.address()));
    info!("Balance of User 2 is {}", gigacoin.balance_of(user2.address()));
    info!("Balance of miner is {}", gigacoin.balance_of(miner.address()));
    info!("Is the chain valid? {}", gigacoin.is_valid());

    report_chain(&gigacoin);

    Ok(())
}
