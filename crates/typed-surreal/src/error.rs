//! Error types for typed-surreal

use thiserror::Error;

use crate::record::RecordId;

/// Errors that can occur while mapping or exchanging typed records
#[derive(Error, Debug)]
pub enum Error {
    /// A generic value did not have the shape the domain type expects
    #[error("Schema mismatch decoding {type_name}: {message}")]
    SchemaMismatch {
        type_name: &'static str,
        message: String,
    },

    /// The store refused a write
    #[error("Write rejected: {0}")]
    Rejected(String),

    /// A relation endpoint does not exist
    #[error("Dangling reference: {id} does not exist")]
    DanglingReference { id: RecordId },

    /// A statement failed; `index` is the statement's position in the batch
    #[error("Statement {index} failed: {message}")]
    Query { index: usize, message: String },

    /// The handle was released
    #[error("Connection closed")]
    ConnectionClosed,

    /// Targeted record does not exist
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),
}

impl Error {
    pub(crate) fn schema_mismatch<T: ?Sized>(err: impl std::fmt::Display) -> Self {
        Error::SchemaMismatch {
            type_name: std::any::type_name::<T>(),
            message: err.to_string(),
        }
    }
}

impl From<surrealdb::Error> for Error {
    fn from(err: surrealdb::Error) -> Self {
        Error::Connection(err.to_string())
    }
}
