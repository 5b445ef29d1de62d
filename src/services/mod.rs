//! Services for fetching, decoding and aggregating banking data

pub mod aggregator;
pub mod fixtures;
pub mod nessie;
pub mod publisher;
pub mod transport;

pub use aggregator::{Aggregator, DataSource, QuickSend};
pub use fixtures::MockSource;
pub use nessie::{GeoFilter, NessieClient, NewAccount, NewCustomer, NewTransaction};
pub use publisher::{SnapshotPublisher, SnapshotReceiver};
pub use transport::{HttpTransport, MemoryTransport, Transport};
