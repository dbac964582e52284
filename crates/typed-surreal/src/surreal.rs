//! SurrealDB transport
//!
//! Connects through `surrealdb::engine::any`, so the same type serves
//! `mem://`, `surrealkv://` and `ws(s)://` endpoints. Every operation is one
//! parameterised SurrealQL batch; table names and record keys travel as bound
//! parameters through `type::table` / `type::thing`. Edge labels are the only
//! names written into statement text, and the client admits identifiers only.

use async_trait::async_trait;
use serde_json::{Map, Value};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::config::ConnectionConfig;
use crate::error::Error;
use crate::mapper;
use crate::record::{RecordId, RecordKey};
use crate::transport::{StatementOutcome, Target, Transport, Vars};
use crate::update::UpdateMode;
use crate::Result;

const FAILED_TRANSACTION: &str = "failed transaction";

/// SurrealDB-backed implementation of [`Transport`].
#[derive(Clone)]
pub struct SurrealTransport {
    db: Surreal<Any>,
}

impl SurrealTransport {
    /// Connect, sign in if credentials are configured, and select the
    /// namespace and database.
    #[instrument(skip(config), fields(endpoint = %config.endpoint, namespace = %config.namespace, database = %config.database))]
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        info!("Connecting to SurrealDB");

        let db = surrealdb::engine::any::connect(config.endpoint.as_str())
            .await
            .map_err(|e| {
                Error::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        if let Some(creds) = &config.credentials {
            if creds.is_root {
                db.signin(Root {
                    username: &creds.username,
                    password: &creds.password,
                })
                .await
                .map_err(|e| Error::Connection(format!("Root authentication failed: {e}")))?;
            } else {
                db.signin(Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username: &creds.username,
                    password: &creds.password,
                })
                .await
                .map_err(|e| Error::Connection(format!("Database authentication failed: {e}")))?;
            }
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                Error::Connection(format!("Failed to select namespace/database: {e}"))
            })?;

        info!("SurrealDB connected");
        Ok(Self { db })
    }

    /// Run a statement batch and collect one outcome per statement.
    async fn run(&self, statement: String, vars: Vars) -> surrealdb::Result<Vec<StatementOutcome>> {
        debug!(%statement, "Executing statement batch");

        let mut query = self.db.query(statement);
        for (name, value) in vars {
            query = query.bind((name, value));
        }
        let mut response = query.await?;

        let count = response.num_statements();
        let mut outcomes = Vec::with_capacity(count);
        for index in 0..count {
            let outcome = response
                .take::<surrealdb::Value>(index)
                .map(into_json)
                .map_err(|e| e.to_string());
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Run a generated write batch; every statement must succeed.
    async fn run_write(&self, statement: String, vars: Vars) -> Result<Vec<Value>> {
        write_rows(self.run(statement, vars).await?)
    }

    /// Run a generated read batch; a failed statement is a query error.
    async fn run_read(&self, statement: String, vars: Vars) -> Result<Vec<Value>> {
        read_rows(self.run(statement, vars).await?)
    }
}

/// Rows of every statement, in order. Inside a transaction every statement
/// reports the abort, so the statement that caused it is surfaced.
fn write_rows(outcomes: Vec<StatementOutcome>) -> Result<Vec<Value>> {
    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(value) => rows.extend(mapper::into_rows(value)),
            Err(message) => errors.push(message),
        }
    }

    let Some(first) = errors.first() else {
        return Ok(rows);
    };
    let cause = errors
        .iter()
        .find(|message| !message.contains(FAILED_TRANSACTION))
        .unwrap_or(first);
    Err(Error::Rejected(cause.clone()))
}

fn read_rows(outcomes: Vec<StatementOutcome>) -> Result<Vec<Value>> {
    let mut rows = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => rows.extend(mapper::into_rows(value)),
            Err(message) => return Err(Error::Query { index, message }),
        }
    }
    Ok(rows)
}

/// Convert a SurrealDB value into the generic form: record ids become their
/// `table:key` text, datetimes become RFC 3339 strings.
fn into_json(value: surrealdb::Value) -> Value {
    value.into_inner().into_json()
}

fn key_value(key: &RecordKey) -> Value {
    match key {
        RecordKey::Number(n) => Value::from(*n),
        RecordKey::String(s) => Value::from(s.as_str()),
    }
}

/// Bind a record id as `<prefix>_tb`/`<prefix>_key` and return the
/// expression that rebuilds it.
fn bind_record(prefix: &str, id: &RecordId, vars: &mut Vars) -> String {
    vars.insert(format!("{prefix}_tb"), Value::from(id.table()));
    vars.insert(format!("{prefix}_key"), key_value(id.key()));
    format!("type::thing(${prefix}_tb, ${prefix}_key)")
}

fn bind_target(target: &Target, vars: &mut Vars) -> String {
    match target {
        Target::Table(table) => {
            vars.insert("target_tb".to_string(), Value::from(table.as_str()));
            "type::table($target_tb)".to_string()
        }
        Target::Record(id) => bind_record("target", id, vars),
    }
}

#[async_trait]
impl Transport for SurrealTransport {
    #[instrument(skip_all, fields(table = %table, count = contents.len()))]
    async fn create(&self, table: &str, contents: Vec<Map<String, Value>>) -> Result<Vec<Value>> {
        let expected = contents.len();
        let mut vars = Vars::new();
        vars.insert("table".to_string(), Value::from(table));

        let mut statement = String::new();
        let batched = expected > 1;
        if batched {
            statement.push_str("BEGIN TRANSACTION;\n");
        }
        for (index, content) in contents.into_iter().enumerate() {
            statement.push_str(&format!(
                "CREATE type::table($table) CONTENT $content_{index};\n"
            ));
            vars.insert(format!("content_{index}"), Value::Object(content));
        }
        if batched {
            statement.push_str("COMMIT TRANSACTION;\n");
        }

        let rows = self.run_write(statement, vars).await?;
        if rows.len() != expected {
            return Err(Error::Rejected(format!(
                "expected {} created records from {}, store returned {}",
                expected,
                table,
                rows.len()
            )));
        }
        Ok(rows)
    }

    #[instrument(skip_all, fields(target = %target))]
    async fn select(&self, target: &Target) -> Result<Vec<Value>> {
        let mut vars = Vars::new();
        let expr = bind_target(target, &mut vars);
        self.run_read(format!("SELECT * FROM {expr};"), vars)
            .await
    }

    #[instrument(skip_all, fields(target = %target, mode = %mode))]
    async fn update(
        &self,
        target: &Target,
        mode: UpdateMode,
        body: Map<String, Value>,
    ) -> Result<Vec<Value>> {
        let mut vars = Vars::new();
        let expr = bind_target(target, &mut vars);
        vars.insert("body".to_string(), Value::Object(body));
        self.run_write(format!("UPDATE {expr} {mode} $body;"), vars)
            .await
    }

    #[instrument(skip_all, fields(target = %target))]
    async fn delete(&self, target: &Target) -> Result<()> {
        let mut vars = Vars::new();
        let expr = bind_target(target, &mut vars);
        self.run_write(format!("DELETE {expr};"), vars).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(from = %from, label = %label, to = %to))]
    async fn relate(&self, from: &RecordId, label: &str, to: &RecordId) -> Result<Value> {
        let mut vars = Vars::new();
        let from_expr = bind_record("edge_in", from, &mut vars);
        let to_expr = bind_record("edge_out", to, &mut vars);
        let statement = format!(
            "LET $edge_in = {from_expr};\nLET $edge_out = {to_expr};\nRELATE $edge_in->{label}->$edge_out;"
        );

        self.run_write(statement, vars)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Rejected(format!("store returned no {label} edge")))
    }

    #[instrument(skip(self, vars))]
    async fn query(&self, statement: &str, vars: Vars) -> Result<Vec<StatementOutcome>> {
        self.run(statement.to_owned(), vars)
            .await
            .map_err(|e| Error::Query {
                index: 0,
                message: e.to_string(),
            })
    }
}
