use anyhow::{bail, Context};
use log::info;

use pow_ledger::blockchain::{Blockchain, Transaction, Wallet};
use pow_ledger::config::ChainConfig;

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ChainConfig::load().context("failed to load chain config")?;

    let wallet_m = Wallet::new();
    let wallet_a = Wallet::new();
    let wallet_b = Wallet::new();

    let blockchain = Blockchain::with_config(wallet_m.address().clone(), config)?;

    // The wallet signs; the chain only sees the public key and the signature
    let transaction = Transaction::new(wallet_a.address().clone(), wallet_b.address().clone(), 1.0);
    let signature = wallet_a.sign_transaction(&transaction)?;
    info!("signature={}", signature);

    let is_added = blockchain.add_transaction(
        wallet_a.address().clone(),
        wallet_b.address().clone(),
        1.0,
        wallet_a.public_key(),
        &signature,
    )?;
    info!("Added? {}", is_added);

    blockchain.mine()?;

    if !blockchain.is_valid()? {
        bail!("mined chain failed validation");
    }

    let chain = blockchain.get_chain()?;
    info!("chain:\n{}", serde_json::to_string_pretty(&chain)?);

    info!("A {:.1}", blockchain.balance_of(wallet_a.address())?);
    info!("B {:.1}", blockchain.balance_of(wallet_b.address())?);
    info!("M {:.1}", blockchain.balance_of(wallet_m.address())?);

    Ok(())
}
