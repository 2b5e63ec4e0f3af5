//! Print the balance of a few addresses.
//!
//! Run with `cargo run -p obelisk-client --features zmq --example balance`.

use obelisk_client::{ClientConfig, ClientError, ObeliskClient};
use obelisk_primitives::Address;
use tracing_subscriber::EnvFilter;

const ADDRESSES: [&str; 3] = [
    "1Dorian4RoXcnBv9hnQ4Y2C1an6NJ4UrjX",
    "1EXoDusjGwvnjZUyKkxZ4UHEf77z6A5S4P",
    "1CounterpartyXXXXXXXXXXXXXXXUWLpVr",
];

const SATOSHIS_PER_COIN: f64 = 1e8;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_filter()))
        .init();

    let client = ObeliskClient::connect_zmq(config)?;
    for text in ADDRESSES {
        let address: Address = text.parse()?;
        match client.fetch_balance(address).await {
            Ok(balance) => println!(
                "Balance for {}: {} (confirmed) {} (unconfirmed)",
                address,
                to_coins(&balance.confirmed),
                to_coins(&balance.unconfirmed),
            ),
            Err(ClientError::Remote(e)) => println!("Balance for {}: {}", address, e),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn to_coins(value: &num_bigint::BigUint) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0) / SATOSHIS_PER_COIN
}
