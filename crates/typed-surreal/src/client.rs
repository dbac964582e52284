//! Typed client
//!
//! `Client` is the entry point for application code: it maps domain types
//! through the mapper, forwards generic requests to a [`Transport`], and
//! returns typed values or lazy [`RecordStream`]s.
//!
//! One client owns one connection-scoped transport. Clones share it, and each
//! request holds the handle's lock for its whole request/response pair, so
//! requests through one handle are serialised. Open several clients for
//! parallel work.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, field, info, instrument, Span};

use crate::config::ConnectionConfig;
use crate::error::Error;
use crate::mapper;
use crate::record::{Edge, Record, RecordId};
use crate::response::{RecordStream, Response};
use crate::surreal::SurrealTransport;
use crate::transport::{Target, Transport, Vars};
use crate::update::Update;
use crate::Result;

/// Shared handle over one transport
#[derive(Clone)]
pub struct Client {
    transport: Arc<Mutex<Option<Box<dyn Transport>>>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("handles", &Arc::strong_count(&self.transport))
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Wrap an already connected transport.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(Mutex::new(Some(Box::new(transport)))),
        }
    }

    /// Connect to SurrealDB as described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        Ok(Self::new(SurrealTransport::connect(config).await?))
    }

    /// Embedded in-memory SurrealDB with the default namespace/database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&ConnectionConfig::in_memory()).await
    }

    /// Release the transport. Every later operation on this handle or any of
    /// its clones fails with [`Error::ConnectionClosed`]. Closing twice is a
    /// no-op.
    pub async fn close(&self) {
        let mut guard = self.transport.lock().await;
        if guard.take().is_some() {
            info!("Client closed");
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.transport.lock().await.is_none()
    }

    /// Create one record in `table`; the store assigns its id.
    #[instrument(skip_all, fields(table = %table))]
    pub async fn create<T: Record>(&self, table: &str, record: &T) -> Result<Vec<T>> {
        self.create_many(table, std::slice::from_ref(record)).await
    }

    /// Create one record per input, returned in input order. Either every
    /// record is created or the call fails.
    #[instrument(skip_all, fields(table = %table, count = records.len()))]
    pub async fn create_many<T: Record>(&self, table: &str, records: &[T]) -> Result<Vec<T>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let contents = records
            .iter()
            .map(mapper::to_content)
            .collect::<Result<Vec<_>>>()?;

        let guard = self.transport.lock().await;
        let transport = guard.as_deref().ok_or(Error::ConnectionClosed)?;
        let rows = transport.create(table, contents).await?;
        drop(guard);

        if rows.len() != records.len() {
            return Err(Error::Rejected(format!(
                "created {} of {} {} records",
                rows.len(),
                records.len(),
                table
            )));
        }
        let created = decode_created::<T>(table, rows)?;
        debug!(count = created.len(), "Created records");
        Ok(created)
    }

    /// Every record of a table, or the one record an id names.
    #[instrument(skip_all, fields(target = tracing::field::Empty))]
    pub async fn select<T: Record>(&self, target: impl Into<Target>) -> Result<RecordStream<T>> {
        let target = target.into();
        Span::current().record("target", field::display(&target));

        let guard = self.transport.lock().await;
        let transport = guard.as_deref().ok_or(Error::ConnectionClosed)?;
        let rows = transport.select(&target).await?;
        debug!(count = rows.len(), "Selected records");
        Ok(RecordStream::new(rows))
    }

    /// The record `id` names, if it exists.
    pub async fn select_record<T: Record>(&self, id: &RecordId) -> Result<Option<T>> {
        self.select::<T>(id).await?.next().transpose()
    }

    /// Apply `update` to a table or one record; yields the records as stored
    /// afterwards.
    #[instrument(skip_all, fields(target = tracing::field::Empty, mode = %update.mode()))]
    pub async fn update<T: Record>(
        &self,
        target: impl Into<Target>,
        update: Update,
    ) -> Result<RecordStream<T>> {
        let target = target.into();
        Span::current().record("target", field::display(&target));
        let (mode, body) = update.into_parts();

        let guard = self.transport.lock().await;
        let transport = guard.as_deref().ok_or(Error::ConnectionClosed)?;
        let rows = transport.update(&target, mode, body).await?;
        debug!(count = rows.len(), "Updated records");
        Ok(RecordStream::new(rows))
    }

    /// Update exactly one record; fails with [`Error::NotFound`] if `id` does
    /// not exist.
    pub async fn update_record<T: Record>(&self, id: &RecordId, update: Update) -> Result<T> {
        self.update::<T>(id, update)
            .await?
            .next()
            .transpose()?
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    /// Remove every record of a table, or the one record an id names.
    /// Edges pointing at removed records are left to the store's policy.
    #[instrument(skip_all, fields(target = tracing::field::Empty))]
    pub async fn delete(&self, target: impl Into<Target>) -> Result<()> {
        let target = target.into();
        Span::current().record("target", field::display(&target));

        let guard = self.transport.lock().await;
        let transport = guard.as_deref().ok_or(Error::ConnectionClosed)?;
        transport.delete(&target).await?;
        debug!("Deleted");
        Ok(())
    }

    /// Store a new edge `from -[label]-> to`. Both endpoints must exist.
    /// Relating the same pair twice stores two edges.
    #[instrument(skip_all, fields(from = %from, label = %label, to = %to))]
    pub async fn relate(&self, from: &RecordId, label: &str, to: &RecordId) -> Result<Edge> {
        if !is_identifier(label) {
            return Err(Error::Rejected(format!(
                "relation label `{label}` is not an identifier"
            )));
        }

        let guard = self.transport.lock().await;
        let transport = guard.as_deref().ok_or(Error::ConnectionClosed)?;
        for endpoint in [from, to] {
            let found = transport.select(&Target::Record(endpoint.clone())).await?;
            if found.is_empty() {
                return Err(Error::DanglingReference {
                    id: endpoint.clone(),
                });
            }
        }

        let edge: Edge = mapper::from_generic(transport.relate(from, label, to).await?)?;
        info!(edge = %edge.id, "Relation stored");
        Ok(edge)
    }

    /// Run a raw statement batch.
    pub async fn query(&self, statement: impl AsRef<str>) -> Result<Response> {
        self.query_with(statement, Vars::new()).await
    }

    /// Run a raw statement batch with named parameters bound as `$name`.
    #[instrument(skip_all, fields(params = vars.len()))]
    pub async fn query_with(&self, statement: impl AsRef<str>, vars: Vars) -> Result<Response> {
        let statement = statement.as_ref();
        debug!(%statement, "Running query");

        let guard = self.transport.lock().await;
        let transport = guard.as_deref().ok_or(Error::ConnectionClosed)?;
        let outcomes = transport.query(statement, vars).await?;
        Ok(Response::new(outcomes))
    }
}

fn decode_created<T: Record>(table: &str, rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            let record: T = mapper::from_generic(row)?;
            if record.id().is_none() {
                return Err(Error::Rejected(format!(
                    "store returned a {table} record without an id"
                )));
            }
            Ok(record)
        })
        .collect()
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(label: &str) -> bool {
    let mut chars = label.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
