//! Storage backend traits.

mod adapter;

pub use adapter::StorageAdapter;
