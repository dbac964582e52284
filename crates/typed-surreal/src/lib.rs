//! typed-surreal: typed records over SurrealDB
//!
//! Lets application code work with records in a schema-less database as
//! strongly-typed Rust values while keeping the database's own semantics:
//! store-issued record ids, CONTENT vs MERGE updates, graph edges and raw
//! multi-statement queries.
//!
//! ## Key Components
//!
//! - `Client`: typed CRUD, relations and queries over one shared connection
//! - `RecordId` / `Record` / `Edge`: identity and the domain-record contract
//! - `Patch` / `Update`: explicit-presence partial updates and their mode
//! - `Response` / `ResultSet` / `RecordStream`: per-statement results decoded
//!   lazily into `T`
//! - `Transport`: the store port, implemented by `SurrealTransport` and the
//!   in-memory `fakes::MemoryTransport`
//!
//! ```ignore
//! let client = Client::in_memory().await?;
//! let created = client.create("publisher", &Publisher::new("SurrealDB")).await?;
//! let books: Vec<Book> = client.select("book").await?.collect::<Result<_>>()?;
//! ```

mod client;
mod config;
mod error;
pub mod fakes;
pub mod mapper;
mod record;
mod response;
mod surreal;
pub mod telemetry;
pub mod transport;
mod update;

pub use client::Client;
pub use config::{
    ConnectionConfig, Credentials, DEFAULT_DATABASE, DEFAULT_ENDPOINT, DEFAULT_NAMESPACE,
};
pub use error::Error;
pub use record::{Edge, Record, RecordId, RecordKey};
pub use response::{RecordStream, Response, ResultSet};
pub use surreal::SurrealTransport;
pub use transport::{StatementOutcome, Target, Transport, Vars};
pub use update::{Patch, Update, UpdateMode};

/// Result type for typed-surreal operations
pub type Result<T> = std::result::Result<T, Error>;
