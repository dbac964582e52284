//! Connection smoke test against the endpoint configured in the environment
//! Run with: cargo run --package typed-surreal --example connect_remote

use typed_surreal::{Client, ConnectionConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    println!("Testing SurrealDB connection...");

    let config = match ConnectionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Invalid environment: {}", e);
            std::process::exit(1);
        }
    };
    println!("  Endpoint: {}", config.endpoint);
    println!("  Namespace: {}", config.namespace);
    println!("  Database: {}", config.database);
    if let Some(creds) = &config.credentials {
        println!("  User: {} (root={})", creds.username, creds.is_root);
    }

    let client = match Client::connect(&config).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("\n✗ Connection failed: {}", e);
            std::process::exit(1);
        }
    };

    match client.query("RETURN 1;").await.and_then(|r| r.check()) {
        Ok(_) => println!("\n✓ Connected and answered a query"),
        Err(e) => {
            eprintln!("\n✗ Query failed: {}", e);
            std::process::exit(1);
        }
    }
    client.close().await;
}
