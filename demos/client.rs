//! WebSocket handshake client example.
//!
//! Run: cargo run --example client -- ws://127.0.0.1:9001/ chat
//!
//! Set `RUST_LOG=wsdial=debug` to watch each attempt.

use std::error::Error;

use tracing_subscriber::EnvFilter;
use wsdial::{Config, client};

const DEFAULT_URL: &str = "ws://127.0.0.1:9001/";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| DEFAULT_URL.to_string());
    let protocols: Vec<String> = args.collect();

    println!("Connecting to {}", url);

    let config = Config::new().with_protocols(protocols);
    let upgraded = client::connect(&url, config).await?;

    println!("Handshake complete with {}", upgraded.endpoint);
    match &upgraded.negotiated.protocol {
        Some(protocol) => println!("Subprotocol: {}", protocol),
        None => println!("Subprotocol: none"),
    }
    for extension in &upgraded.negotiated.extensions {
        println!("Extension offered by server: {}", extension);
    }
    if !upgraded.buffered.is_empty() {
        println!("{} bytes already received after the handshake", upgraded.buffered.len());
    }

    Ok(())
}
