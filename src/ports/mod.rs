pub mod storage;

// Re-export all port traits for convenience
pub use storage::{BlobStore, Connector, ObjectEntry, PutReceipt};
