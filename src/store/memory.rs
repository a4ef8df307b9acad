//! In-memory column store
//!
//! This is primarily for development and testing.
//! It understands only the statements issued by [`SessionTable`](super::SessionTable)
//! and mimics Cassandra's TTL rules for them.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Cluster, Connection, CqlValue, Row, StorageError};

/// Largest TTL Cassandra accepts, 20 years
pub const MAX_TTL: i32 = 630_720_000;

struct StoredRow {
    values: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredRow {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |exp| exp > now)
    }
}

type Tables = HashMap<String, HashMap<String, StoredRow>>;

#[derive(Default)]
struct Stats {
    connections: AtomicUsize,
    open: AtomicUsize,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

/// In-memory cluster with `(id, values)` session tables
///
/// Warning: This store is not suitable for production use because:
/// - Sessions are lost on server restart
/// - Sessions are not shared across multiple server instances
/// - Expired rows are only dropped by [`MemoryCluster::purge_expired`]
#[derive(Clone, Default)]
pub struct MemoryCluster {
    tables: Arc<RwLock<Tables>>,
    stats: Arc<Stats>,
}

impl MemoryCluster {
    /// Create a cluster with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the given session table
    pub fn with_table<S: Into<String>>(self, table: S) -> Self {
        self.tables.write().entry(table.into()).or_default();
        self
    }

    /// Make every subsequent `connect` fail, or recover from that
    pub fn set_unavailable(&self, unavailable: bool) {
        self.stats.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Store raw bytes under an id without TTL
    pub fn insert_raw(&self, table: &str, id: &str, values: Vec<u8>) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(
                id.to_string(),
                StoredRow {
                    values,
                    expires_at: None,
                },
            );
    }

    /// Live rows in a table
    pub fn len(&self, table: &str) -> usize {
        let now = Instant::now();
        self.tables
            .read()
            .get(table)
            .map_or(0, |rows| rows.values().filter(|row| row.is_live(now)).count())
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Drop rows whose TTL has elapsed
    pub fn purge_expired(&self) {
        let now = Instant::now();
        for rows in self.tables.write().values_mut() {
            rows.retain(|_, row| row.is_live(now));
        }
    }

    /// Total connections handed out
    pub fn connections(&self) -> usize {
        self.stats.connections.load(Ordering::SeqCst)
    }

    /// Connections handed out and not yet dropped
    pub fn open_connections(&self) -> usize {
        self.stats.open.load(Ordering::SeqCst)
    }

    /// Successful writes
    pub fn writes(&self) -> usize {
        self.stats.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cluster for MemoryCluster {
    async fn connect(&self) -> Result<Box<dyn Connection>, StorageError> {
        if self.stats.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Connect(
                "no hosts available in the pool".to_string(),
            ));
        }
        self.stats.connections.fetch_add(1, Ordering::SeqCst);
        self.stats.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            cluster: self.clone(),
        }))
    }
}

struct MemoryConnection {
    cluster: MemoryCluster,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.cluster.stats.open.fetch_sub(1, Ordering::SeqCst);
    }
}

fn select_table(statement: &str) -> Option<&str> {
    statement
        .strip_prefix("SELECT values FROM ")?
        .strip_suffix(" WHERE id = ?")
}

fn insert_table(statement: &str) -> Option<&str> {
    statement
        .strip_prefix("INSERT INTO ")?
        .strip_suffix(" (id, values) VALUES (?, ?) USING TTL ?")
}

fn unconfigured(table: &str) -> StorageError {
    StorageError::Query(format!("unconfigured table {}", table))
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn query(
        &mut self,
        statement: &str,
        params: &[CqlValue],
    ) -> Result<Option<Row>, StorageError> {
        let table = select_table(statement)
            .ok_or_else(|| StorageError::Query(format!("unsupported statement: {}", statement)))?;
        let id = match params {
            [CqlValue::Text(id)] => id,
            _ => return Err(StorageError::Query("expected one text parameter".to_string())),
        };

        let tables = self.cluster.tables.read();
        let rows = tables.get(table).ok_or_else(|| unconfigured(table))?;

        Ok(rows
            .get(id)
            .filter(|row| row.is_live(Instant::now()))
            .map(|row| vec![CqlValue::Blob(row.values.clone())]))
    }

    async fn execute(&mut self, statement: &str, params: &[CqlValue]) -> Result<(), StorageError> {
        let table = insert_table(statement)
            .ok_or_else(|| StorageError::Query(format!("unsupported statement: {}", statement)))?;
        let (id, values, ttl) = match params {
            [CqlValue::Text(id), CqlValue::Blob(values), CqlValue::Int(ttl)] => (id, values, *ttl),
            _ => {
                return Err(StorageError::Query(
                    "expected text, blob and int parameters".to_string(),
                ))
            }
        };

        if !(0..=MAX_TTL).contains(&ttl) {
            return Err(StorageError::Query(format!(
                "ttl must be between 0 and {}, got {}",
                MAX_TTL, ttl
            )));
        }
        // TTL 0 means the row never expires
        let expires_at = (ttl > 0).then(|| Instant::now() + Duration::from_secs(ttl as u64));

        let mut tables = self.cluster.tables.write();
        let rows = tables.get_mut(table).ok_or_else(|| unconfigured(table))?;
        rows.insert(
            id.clone(),
            StoredRow {
                values: values.clone(),
                expires_at,
            },
        );
        self.cluster.stats.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
