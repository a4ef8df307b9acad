//! Column store capability traits
//!
//! These describe just enough of a Cassandra-style client for the session
//! table: open a connection, run a statement that returns at most one row we
//! care about, run a statement that returns nothing. Dropping a connection
//! releases it.

use async_trait::async_trait;
use thiserror::Error;

/// A bound statement parameter or a column value
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    Text(String),
    Blob(Vec<u8>),
    Int(i32),
}

impl CqlValue {
    /// CQL type name, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CqlValue::Text(_) => "text",
            CqlValue::Blob(_) => "blob",
            CqlValue::Int(_) => "int",
        }
    }
}

/// Column values of one result row, in select order
pub type Row = Vec<CqlValue>;

/// Errors raised by the column store
#[derive(Debug, Error)]
pub enum StorageError {
    /// No connection could be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The statement was rejected or failed to execute
    #[error("query failed: {0}")]
    Query(String),

    /// A row came back with an unexpected shape
    #[error("unexpected column: {0}")]
    Column(String),
}

/// Cluster configuration able to hand out connections.
///
/// The session table opens one connection per operation and never caches it.
#[async_trait]
pub trait Cluster: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn Connection>, StorageError>;
}

/// An open connection to the cluster
#[async_trait]
pub trait Connection: Send {
    /// Run a statement and return its first row, if any
    async fn query(
        &mut self,
        statement: &str,
        params: &[CqlValue],
    ) -> Result<Option<Row>, StorageError>;

    /// Run a statement for its side effect
    async fn execute(&mut self, statement: &str, params: &[CqlValue]) -> Result<(), StorageError>;
}
