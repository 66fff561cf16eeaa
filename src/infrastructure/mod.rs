//! Storage backends and the local payment gateway. Backends are swappable
//! behind the domain ports and selected once at startup.

pub mod gateway;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
