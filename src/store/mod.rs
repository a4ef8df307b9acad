//! Session persistence on a column store

mod memory;
mod table;
mod traits;

pub use memory::{MemoryCluster, MAX_TTL};
pub use table::SessionTable;
pub use traits::{Cluster, Connection, CqlValue, Row, StorageError};
