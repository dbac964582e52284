//! Transport port
//!
//! The request/response primitive the client drives. Implementations shape
//! generic values into store requests and hand generic values back; they know
//! nothing about domain types.
//!
//! - `SurrealTransport`: SurrealDB through `surrealdb::engine::any`
//! - `fakes::MemoryTransport`: in-process tables for tests

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::record::RecordId;
use crate::update::UpdateMode;
use crate::Result;

/// Named statement parameters, referenced as `$name`
pub type Vars = BTreeMap<String, Value>;

/// Result of one statement: its rows, or the store's error message
pub type StatementOutcome = std::result::Result<Value, String>;

/// What an operation applies to: every row of a table, or one record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Table(String),
    Record(RecordId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Table(table) => f.write_str(table),
            Target::Record(id) => write!(f, "{id}"),
        }
    }
}

impl From<&str> for Target {
    fn from(table: &str) -> Self {
        Target::Table(table.to_string())
    }
}

impl From<String> for Target {
    fn from(table: String) -> Self {
        Target::Table(table)
    }
}

impl From<RecordId> for Target {
    fn from(id: RecordId) -> Self {
        Target::Record(id)
    }
}

impl From<&RecordId> for Target {
    fn from(id: &RecordId) -> Self {
        Target::Record(id.clone())
    }
}

/// Connection-scoped request/response primitive.
///
/// Guarantees expected by the client:
/// - `create` returns one stored record per content, in input order, each with
///   an `id`; a refused row fails the call with `Error::Rejected`.
/// - `update` and `delete` never change a record's `id`.
/// - `query` returns one outcome per statement, numbered as submitted.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Insert each content as a new record of `table`.
    async fn create(&self, table: &str, contents: Vec<Map<String, Value>>) -> Result<Vec<Value>>;

    /// Fetch every record of a table, or the one record (empty if missing).
    async fn select(&self, target: &Target) -> Result<Vec<Value>>;

    /// Apply a CONTENT or MERGE body; returns the records after the update.
    async fn update(
        &self,
        target: &Target,
        mode: UpdateMode,
        body: Map<String, Value>,
    ) -> Result<Vec<Value>>;

    /// Remove every record of a table, or the one record.
    async fn delete(&self, target: &Target) -> Result<()>;

    /// Store an edge record `from -[label]-> to`; returns the edge.
    async fn relate(&self, from: &RecordId, label: &str, to: &RecordId) -> Result<Value>;

    /// Execute a raw statement batch with bound parameters.
    async fn query(&self, statement: &str, vars: Vars) -> Result<Vec<StatementOutcome>>;
}
