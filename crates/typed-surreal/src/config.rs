//! Connection configuration
//!
//! Endpoint, namespace/database selection and optional sign-in. Supports
//! in-memory (`mem://`), local (`surrealkv://path`) and remote (`ws://`,
//! `wss://`) endpoints.

use std::fmt;

use crate::error::Error;
use crate::Result;

/// Default endpoint: an embedded in-memory database
pub const DEFAULT_ENDPOINT: &str = "mem://";
/// Default namespace
pub const DEFAULT_NAMESPACE: &str = "example";
/// Default database
pub const DEFAULT_DATABASE: &str = "example";

/// Sign-in credentials
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Root user (true) or database user scoped to the namespace/database (false)
    pub is_root: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("is_root", &self.is_root)
            .finish()
    }
}

/// Configuration for a SurrealDB connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Endpoint URL (e.g., "mem://", "ws://localhost:8000")
    pub endpoint: String,
    /// Namespace (default: "example")
    pub namespace: String,
    /// Database name (default: "example")
    pub database: String,
    /// Sign-in credentials; `None` connects anonymously
    pub credentials: Option<Credentials>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl ConnectionConfig {
    /// Anonymous connection to `endpoint` using the default namespace/database
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            credentials: None,
        }
    }

    /// Embedded in-memory database
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Sign in as a database user
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
            is_root: false,
        });
        self
    }

    /// Sign in as a root user
    pub fn with_root_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
            is_root: true,
        });
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_ENDPOINT (optional, default: "mem://")
    /// - SURREALDB_NAMESPACE (optional, default: "example")
    /// - SURREALDB_DATABASE (optional, default: "example")
    /// - SURREALDB_USERNAME / SURREALDB_PASSWORD (optional, both or neither)
    /// - SURREALDB_ROOT (optional, default: "false") - set to "true" for root users
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = lookup("SURREALDB_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let namespace =
            lookup("SURREALDB_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let database = lookup("SURREALDB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let is_root = lookup("SURREALDB_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let credentials = match (lookup("SURREALDB_USERNAME"), lookup("SURREALDB_PASSWORD")) {
            (Some(username), Some(password)) => Some(Credentials {
                username,
                password,
                is_root,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(Error::Connection(
                    "SURREALDB_USERNAME set without SURREALDB_PASSWORD".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(Error::Connection(
                    "SURREALDB_PASSWORD set without SURREALDB_USERNAME".to_string(),
                ))
            }
        };

        Ok(Self {
            endpoint,
            namespace,
            database,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = ConnectionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.endpoint, "mem://");
        assert_eq!(config.namespace, "example");
        assert_eq!(config.database, "example");
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_env_credentials_and_root_flag() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            ("SURREALDB_ENDPOINT", "ws://localhost:8000"),
            ("SURREALDB_NAMESPACE", "books"),
            ("SURREALDB_USERNAME", "root"),
            ("SURREALDB_PASSWORD", "secret"),
            ("SURREALDB_ROOT", "TRUE"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, "ws://localhost:8000");
        assert_eq!(config.namespace, "books");
        let creds = config.credentials.unwrap();
        assert_eq!(creds.username, "root");
        assert!(creds.is_root);
    }

    #[test]
    fn test_env_half_credentials_rejected() {
        let err = ConnectionConfig::from_lookup(lookup(&[("SURREALDB_USERNAME", "root")]))
            .unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ConnectionConfig::new("ws://db").with_root_credentials("root", "hunter2");
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("root"));
    }

    #[test]
    fn test_builder() {
        let config = ConnectionConfig::in_memory()
            .with_namespace("ns")
            .with_database("db")
            .with_credentials("user", "pass");
        assert_eq!(config.namespace, "ns");
        assert_eq!(config.database, "db");
        assert!(!config.credentials.unwrap().is_root);
    }
}
