//! In-memory transport (testing only)
//!
//! `MemoryTransport` keeps tables in process and follows the same contract as
//! the SurrealDB transport for the structured operations, including removal of
//! edges whose `in` or `out` record is deleted. Raw queries are not
//! interpreted: they are answered from replies registered with
//! [`MemoryTransport::with_query_response`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Error;
use crate::mapper::ID_FIELD;
use crate::record::{RecordId, RecordKey};
use crate::transport::{StatementOutcome, Target, Transport, Vars};
use crate::update::{self, UpdateMode};
use crate::Result;

type Row = Map<String, Value>;

#[derive(Debug, Default)]
struct MemoryState {
    /// Rows per table, in insertion order
    tables: BTreeMap<String, Vec<Row>>,
    /// Canned replies keyed by trimmed statement text
    replies: HashMap<String, Vec<StatementOutcome>>,
    /// Tables whose writes are refused, with the refusal message
    refusals: HashMap<String, String>,
    /// Every raw query received, with its parameters
    queries: Vec<(String, Vars)>,
}

impl MemoryState {
    fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    fn find(&self, id: &RecordId) -> Option<&Row> {
        let text = id_value(id);
        self.rows(id.table())
            .iter()
            .find(|row| row.get(ID_FIELD) == Some(&text))
    }

    fn check_writable(&self, table: &str) -> Result<()> {
        match self.refusals.get(table) {
            Some(message) => Err(Error::Rejected(message.clone())),
            None => Ok(()),
        }
    }

    fn insert(&mut self, table: &str, mut row: Row) -> Row {
        let id = RecordId::new(table, RecordKey::String(Uuid::new_v4().simple().to_string()));
        row.insert(ID_FIELD.to_string(), id_value(&id));
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    /// Drop every edge row whose `in` or `out` is one of `gone`.
    fn remove_incident_edges(&mut self, gone: &[Value]) {
        let incident = |row: &Row| {
            ["in", "out"]
                .iter()
                .any(|end| row.get(*end).is_some_and(|v| gone.contains(v)))
        };
        for rows in self.tables.values_mut() {
            rows.retain(|row| !incident(row));
        }
    }
}

fn id_value(id: &RecordId) -> Value {
    Value::String(id.to_string())
}

/// In-memory [`Transport`] backed by a `BTreeMap<table, Vec<row>>`.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `statement` (compared after trimming) with `outcomes`.
    pub fn with_query_response(
        self,
        statement: impl AsRef<str>,
        outcomes: Vec<StatementOutcome>,
    ) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state
                .replies
                .insert(statement.as_ref().trim().to_string(), outcomes);
        }
        self
    }

    /// Refuse every write to `table` with `message`.
    pub fn with_rejected_table(self, table: impl Into<String>, message: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.refusals.insert(table.into(), message.into());
        }
        self
    }

    /// Number of rows currently stored in `table`
    pub fn table_len(&self, table: &str) -> usize {
        self.state
            .lock()
            .map(|state| state.rows(table).len())
            .unwrap_or(0)
    }

    /// Raw queries received so far, in order
    pub fn queries(&self) -> Vec<(String, Vars)> {
        self.state
            .lock()
            .map(|state| state.queries.clone())
            .unwrap_or_default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Connection("memory transport lock poisoned".to_string()))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn create(&self, table: &str, contents: Vec<Row>) -> Result<Vec<Value>> {
        let mut state = self.state()?;
        state.check_writable(table)?;

        Ok(contents
            .into_iter()
            .map(|content| Value::Object(state.insert(table, content)))
            .collect())
    }

    async fn select(&self, target: &Target) -> Result<Vec<Value>> {
        let state = self.state()?;
        let rows = match target {
            Target::Table(table) => state.rows(table).to_vec(),
            Target::Record(id) => state.find(id).cloned().into_iter().collect(),
        };
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn update(&self, target: &Target, mode: UpdateMode, body: Row) -> Result<Vec<Value>> {
        let mut state = self.state()?;
        let table = match target {
            Target::Table(table) => table.as_str(),
            Target::Record(id) => id.table(),
        };
        state.check_writable(table)?;

        let wanted = match target {
            Target::Record(id) => Some(id_value(id)),
            Target::Table(_) => None,
        };
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if let Some(wanted) = &wanted {
                if row.get(ID_FIELD) != Some(wanted) {
                    continue;
                }
            }
            update::apply(row, mode, &body);
            updated.push(Value::Object(row.clone()));
        }
        Ok(updated)
    }

    async fn delete(&self, target: &Target) -> Result<()> {
        let mut state = self.state()?;
        let removed: Vec<Row> = match target {
            Target::Table(table) => {
                state.check_writable(table)?;
                state.tables.remove(table).unwrap_or_default()
            }
            Target::Record(id) => {
                state.check_writable(id.table())?;
                let wanted = id_value(id);
                match state.tables.get_mut(id.table()) {
                    Some(rows) => {
                        let (removed, kept): (Vec<Row>, Vec<Row>) = std::mem::take(rows)
                            .into_iter()
                            .partition(|row| row.get(ID_FIELD) == Some(&wanted));
                        *rows = kept;
                        removed
                    }
                    None => Vec::new(),
                }
            }
        };

        let gone: Vec<Value> = removed
            .into_iter()
            .filter_map(|mut row| row.remove(ID_FIELD))
            .collect();
        if !gone.is_empty() {
            state.remove_incident_edges(&gone);
        }
        Ok(())
    }

    async fn relate(&self, from: &RecordId, label: &str, to: &RecordId) -> Result<Value> {
        let mut state = self.state()?;
        state.check_writable(label)?;
        for endpoint in [from, to] {
            if state.find(endpoint).is_none() {
                return Err(Error::DanglingReference {
                    id: endpoint.clone(),
                });
            }
        }

        let mut edge = Row::new();
        edge.insert("in".to_string(), id_value(from));
        edge.insert("out".to_string(), id_value(to));
        Ok(Value::Object(state.insert(label, edge)))
    }

    async fn query(&self, statement: &str, vars: Vars) -> Result<Vec<StatementOutcome>> {
        let mut state = self.state()?;
        let key = statement.trim().to_string();
        state.queries.push((key.clone(), vars));

        state.replies.get(&key).cloned().ok_or_else(|| Error::Query {
            index: 0,
            message: format!("no reply registered for `{key}`"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_distinct_ids_in_order() {
        let transport = MemoryTransport::new();
        let rows = transport
            .create(
                "book",
                vec![content(json!({"title": "A"})), content(json!({"title": "B"}))],
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"], json!("A"));
        assert_eq!(rows[1]["title"], json!("B"));
        assert_ne!(rows[0]["id"], rows[1]["id"]);
        assert!(rows[0]["id"].as_str().unwrap().starts_with("book:"));
        assert_eq!(transport.table_len("book"), 2);
    }

    #[tokio::test]
    async fn test_rejected_table_writes_nothing() {
        let transport = MemoryTransport::new().with_rejected_table("book", "read only");
        let err = transport
            .create("book", vec![content(json!({"title": "A"}))])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Rejected(ref m) if m == "read only"));
        assert_eq!(transport.table_len("book"), 0);
    }

    #[tokio::test]
    async fn test_update_missing_record_is_empty() {
        let transport = MemoryTransport::new();
        let ghost = RecordId::parse("book:ghost").unwrap();
        let rows = transport
            .update(&Target::Record(ghost), UpdateMode::Merge, Row::new())
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_incident_edges() {
        let transport = MemoryTransport::new();
        let mut ids = Vec::new();
        for table in ["a", "b", "c"] {
            let row = transport
                .create(table, vec![content(json!({}))])
                .await
                .unwrap();
            ids.push(RecordId::parse(row[0]["id"].as_str().unwrap()).unwrap());
        }
        let (a, b, c) = (&ids[0], &ids[1], &ids[2]);

        transport.relate(a, "links", b).await.unwrap();
        transport.relate(c, "links", a).await.unwrap();
        transport.relate(a, "links", c).await.unwrap();

        transport.delete(&Target::Record(b.clone())).await.unwrap();
        assert_eq!(transport.table_len("b"), 0);
        assert_eq!(transport.table_len("links"), 2);

        transport.delete(&Target::Table("c".to_string())).await.unwrap();
        assert_eq!(transport.table_len("links"), 0);
        assert_eq!(transport.table_len("a"), 1);
    }

    #[tokio::test]
    async fn test_query_uses_registered_reply() {
        let transport = MemoryTransport::new()
            .with_query_response("RETURN 1;", vec![Ok(json!(1))]);

        let mut vars = Vars::new();
        vars.insert("x".to_string(), json!(2));
        let outcomes = transport.query("  RETURN 1;\n", vars).await.unwrap();
        assert_eq!(outcomes, vec![Ok(json!(1))]);
        assert_eq!(transport.queries()[0].1["x"], json!(2));

        let err = transport.query("RETURN 2;", Vars::new()).await.unwrap_err();
        assert!(matches!(err, Error::Query { index: 0, .. }));
    }
}
