//! Query responses and lazily decoded result streams
//!
//! A [`Response`] holds one outcome per submitted statement, indexed exactly
//! as the store numbered them. [`ResultSet`] is one statement's rows, and
//! [`RecordStream`] decodes those rows into `T` one element per `next()`.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::error::Error;
use crate::mapper;
use crate::transport::StatementOutcome;
use crate::Result;

/// Outcome of a statement batch
#[derive(Debug)]
pub struct Response {
    /// `None` once the slot has been taken
    outcomes: Vec<Option<StatementOutcome>>,
}

impl Response {
    pub(crate) fn new(outcomes: Vec<StatementOutcome>) -> Self {
        Self {
            outcomes: outcomes.into_iter().map(Some).collect(),
        }
    }

    /// Number of statements the store reported, taken or not
    pub fn num_statements(&self) -> usize {
        self.outcomes.len()
    }

    /// Remove and return the result of statement `index`.
    ///
    /// Fails with [`Error::Query`] carrying `index` if that statement failed,
    /// does not exist, or was already taken.
    pub fn take(&mut self, index: usize) -> Result<ResultSet> {
        let slot = self.outcomes.get_mut(index).ok_or_else(|| Error::Query {
            index,
            message: format!("no statement at index {index}"),
        })?;

        match slot.take() {
            Some(Ok(value)) => Ok(ResultSet::new(mapper::into_rows(value))),
            Some(Err(message)) => Err(Error::Query { index, message }),
            None => Err(Error::Query {
                index,
                message: "result already taken".to_string(),
            }),
        }
    }

    /// Failed statements as `(index, message)`, in statement order
    pub fn errors(&self) -> impl Iterator<Item = (usize, &str)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Some(Err(message)) => Some((index, message.as_str())),
                _ => None,
            })
    }

    /// Return the response unchanged if no statement failed, otherwise the
    /// first failure.
    pub fn check(self) -> Result<Self> {
        if let Some((index, message)) = self.errors().next() {
            return Err(Error::Query {
                index,
                message: message.to_string(),
            });
        }
        Ok(self)
    }
}

/// Rows produced by one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<Value>,
}

impl ResultSet {
    pub(crate) fn new(rows: Vec<Value>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Decode lazily as `T`.
    pub fn records<T: DeserializeOwned>(self) -> RecordStream<T> {
        RecordStream::new(self.rows)
    }

    /// Decode only the first row.
    pub fn first<T: DeserializeOwned>(self) -> Result<Option<T>> {
        self.records().next().transpose()
    }

    /// The raw generic rows
    pub fn into_values(self) -> Vec<Value> {
        self.rows
    }
}

/// One-shot sequence of typed records.
///
/// Each `next()` decodes a single buffered row; a row that does not fit `T`
/// yields `Err(Error::SchemaMismatch)` without ending the stream. The stream
/// cannot be restarted: iterate again by re-running the operation.
pub struct RecordStream<T> {
    rows: std::vec::IntoIter<Value>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RecordStream<T> {
    pub(crate) fn new(rows: Vec<Value>) -> Self {
        Self {
            rows: rows.into_iter(),
            _marker: PhantomData,
        }
    }

    /// Rows not yet decoded
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.rows.len() == 0
    }
}

impl<T> std::fmt::Debug for RecordStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("type", &std::any::type_name::<T>())
            .field("remaining", &self.rows.len())
            .finish()
    }
}

impl<T: DeserializeOwned> Iterator for RecordStream<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(mapper::from_generic)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<T: DeserializeOwned> ExactSizeIterator for RecordStream<T> {}

impl<T: DeserializeOwned> FusedIterator for RecordStream<T> {}
