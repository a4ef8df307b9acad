//! The `(id, values)` session table

use std::sync::Arc;

use super::{Cluster, CqlValue, StorageError};
use crate::error::SessionError;

/// Point reads and TTL upserts against one session table.
///
/// Every call opens its own connection and drops it before returning, on
/// success and on error alike. Nothing is cached between calls.
#[derive(Clone)]
pub struct SessionTable {
    cluster: Arc<dyn Cluster>,
    name: String,
    select: String,
    insert: String,
}

impl SessionTable {
    pub fn new<S: Into<String>>(cluster: Arc<dyn Cluster>, name: S) -> Self {
        let name = name.into();
        Self {
            select: format!("SELECT values FROM {} WHERE id = ?", name),
            insert: format!(
                "INSERT INTO {} (id, values) VALUES (?, ?) USING TTL ?",
                name
            ),
            cluster,
            name,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch the serialized payload of a session.
    ///
    /// A missing row is [`SessionError::NotFound`].
    pub async fn get(&self, id: &str) -> Result<Vec<u8>, SessionError> {
        let mut conn = self.cluster.connect().await?;
        let row = conn
            .query(&self.select, &[CqlValue::Text(id.to_string())])
            .await?;

        let Some(row) = row else {
            return Err(SessionError::NotFound);
        };
        match row.into_iter().next() {
            Some(CqlValue::Blob(values)) => Ok(values),
            Some(other) => Err(StorageError::Column(format!(
                "values: expected blob, got {}",
                other.type_name()
            ))
            .into()),
            None => Err(StorageError::Column("values: missing from row".to_string()).into()),
        }
    }

    /// Upsert the serialized payload of a session with a TTL in seconds
    pub async fn put(&self, id: &str, values: &[u8], ttl_secs: i64) -> Result<(), SessionError> {
        let ttl = i32::try_from(ttl_secs)
            .map_err(|_| StorageError::Query(format!("ttl {} does not fit in an int", ttl_secs)))?;

        let mut conn = self.cluster.connect().await?;
        conn.execute(
            &self.insert,
            &[
                CqlValue::Text(id.to_string()),
                CqlValue::Blob(values.to_vec()),
                CqlValue::Int(ttl),
            ],
        )
        .await?;
        Ok(())
    }
}

impl std::fmt::Debug for SessionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTable")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCluster;

    fn table(cluster: &MemoryCluster) -> SessionTable {
        SessionTable::new(Arc::new(cluster.clone()), "sessions")
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cluster = MemoryCluster::new().with_table("sessions");
        let table = table(&cluster);

        table.put("abc", br#"{"user":"alice"}"#, 3600).await.unwrap();
        assert_eq!(table.get("abc").await.unwrap(), br#"{"user":"alice"}"#);

        // Upsert replaces
        table.put("abc", b"{}", 3600).await.unwrap();
        assert_eq!(table.get("abc").await.unwrap(), b"{}");
        assert_eq!(cluster.writes(), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let cluster = MemoryCluster::new().with_table("sessions");
        let err = table(&cluster).get("never-issued").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_connection_errors_are_not_not_found() {
        let cluster = MemoryCluster::new().with_table("sessions");
        cluster.set_unavailable(true);
        let table = table(&cluster);

        let err = table.get("abc").await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(StorageError::Connect(_))));
        assert!(err.to_string().starts_with("storage: "));

        assert!(table.put("abc", b"{}", 60).await.is_err());
    }

    #[tokio::test]
    async fn test_connections_released_on_every_path() {
        let cluster = MemoryCluster::new().with_table("sessions");
        let table = table(&cluster);

        table.put("abc", b"{}", 60).await.unwrap();
        table.get("abc").await.unwrap();
        table.get("missing").await.unwrap_err();
        table.put("abc", b"{}", -5).await.unwrap_err();

        let wrong = SessionTable::new(Arc::new(cluster.clone()), "other");
        wrong.get("abc").await.unwrap_err();

        assert_eq!(cluster.connections(), 5);
        assert_eq!(cluster.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_ttl_out_of_int_range_fails_before_connecting() {
        let cluster = MemoryCluster::new().with_table("sessions");
        let err = table(&cluster)
            .put("abc", b"{}", i64::from(i32::MAX) + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Storage(StorageError::Query(_))));
        assert_eq!(cluster.connections(), 0);
    }
}
