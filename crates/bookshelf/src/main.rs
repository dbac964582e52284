//! bookshelf - typed-surreal walkthrough
//!
//! Connects to SurrealDB (embedded in-memory by default), runs the
//! Publisher/Book walkthrough and prints what each step returned.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use typed_surreal::telemetry::init_tracing;
use typed_surreal::{Client, ConnectionConfig};

use bookshelf::walkthrough::{self, Report};
use bookshelf::{Book, Library};

#[derive(Parser)]
#[command(name = "bookshelf")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Typed records over SurrealDB: publisher/book walkthrough", long_about = None)]
struct Cli {
    /// SurrealDB endpoint (mem://, surrealkv://path, ws://host:port)
    #[arg(long, env = "SURREALDB_ENDPOINT")]
    endpoint: Option<String>,

    /// Namespace to use
    #[arg(long, env = "SURREALDB_NAMESPACE")]
    namespace: Option<String>,

    /// Database to use
    #[arg(long, env = "SURREALDB_DATABASE")]
    database: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn connection_config(&self) -> Result<ConnectionConfig> {
        let mut config =
            ConnectionConfig::from_env().context("Invalid SurrealDB environment")?;
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level, &[env!("CARGO_CRATE_NAME")]);

    let config = cli.connection_config()?;
    info!(endpoint = %config.endpoint, "Starting bookshelf");
    let client = Client::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.endpoint))?;

    let library = Library::new(client.clone());
    let report = walkthrough::run(&library)
        .await
        .context("Walkthrough failed")?;
    print_report(&report)?;

    client.close().await;
    Ok(())
}

fn print_report(report: &Report) -> Result<()> {
    println!("Publisher: {}", serde_json::to_string_pretty(&report.publisher)?);
    println!("Book: {}", serde_json::to_string_pretty(&report.first_book)?);
    println!(
        "Relation: {} -[{}]-> {}",
        report.edge.from,
        report.edge.label(),
        report.edge.to
    );
    println!(
        "After CONTENT update: {}",
        serde_json::to_string_pretty(&report.after_content_update)?
    );
    println!("Book: {}", serde_json::to_string_pretty(&report.second_book)?);
    println!(
        "Relation: {} -[{}]-> {}",
        report.second_edge.from,
        report.second_edge.label(),
        report.second_edge.to
    );
    print_books("All books", &report.listed)?;
    print_books("After MERGE update", &report.after_merge_update)?;
    print_books(
        &format!("Books by {}", walkthrough::FEATURED_AUTHOR),
        &report.by_author,
    )?;
    for (book, publishers) in [
        (&report.first_book, &report.publishers_of_first),
        (&report.second_book, &report.publishers_of_second),
    ] {
        for publisher in publishers {
            println!("{} published by: {}", book.title, publisher.name);
        }
    }
    Ok(())
}

fn print_books(heading: &str, books: &[Book]) -> Result<()> {
    println!("{heading}:");
    for book in books {
        println!("  {}", serde_json::to_string(book)?);
    }
    Ok(())
}
