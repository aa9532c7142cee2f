pub mod common_io; // gz-aware buffered readers and writers
pub mod error; // error taxonomy shared with the viewer core
pub mod gct; // GCT expression tables
pub mod labels; // ordering of `k1`, `t12` style labels
pub mod loader; // dashboard tables -> data store
pub mod store; // immutable snapshot of all precomputed tables
pub mod tables; // named matrices read from delimited files

pub use error::{Result, ViewerError};
pub use store::{AssociationTables, DataStore, DataStoreBuilder, TableKind};
