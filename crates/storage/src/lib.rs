//! Storage layer for the LMS client
//!
//! This crate provides the persistent key-value seam the state services
//! load from and write to, with a durable sled store and an in-memory store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod keys;
pub mod kv;
pub mod memory;

pub use kv::{KeyValueStore, KeyValueStoreExt, KvConfig, KvError, KvStore, Result};
pub use memory::MemoryStore;
