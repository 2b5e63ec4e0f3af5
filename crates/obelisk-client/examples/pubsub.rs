//! Print new blocks and unconfirmed transactions as they are announced.
//!
//! Run with `cargo run -p obelisk-client --features zmq --example pubsub`.

use obelisk_client::{ClientConfig, ObeliskClient};
use obelisk_primitives::hash::double_hash;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_filter()))
        .init();

    let client = ObeliskClient::connect_zmq(config)?;

    client.subscribe_blocks(|block| {
        let hash = double_hash(&block.header);
        println!("BLOCK: {} {} ({} txs)", block.height, hash, block.transactions.len());
    })?;
    client.subscribe_transactions(|tx| {
        let txid = double_hash(&tx);
        println!("TX: {} {}", txid, hex::encode(&tx));
    })?;

    tokio::signal::ctrl_c().await?;
    client.unsubscribe_blocks();
    client.unsubscribe_transactions();
    Ok(())
}
