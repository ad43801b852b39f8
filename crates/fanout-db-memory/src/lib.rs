//! # fanout-db-memory
//!
//! In-memory [`WorkloadStore`] backend on a lock-free concurrent map.
//!
//! This is the backend the engine's test suites run against, and a usable
//! store for single-process deployments. It keeps every workload under its
//! `namespace/name` key and satisfies the full store contract: owned
//! copies on read, generated names on create, idempotent delete.
//!
//! [`WorkloadStore`]: fanout_storage::WorkloadStore

mod store;

pub use store::InMemoryStore;
