//! Vault module — encrypted item storage.
//!
//! This module provides:
//! - `VaultItem`, `VaultItemSummary` and request types (`item`)
//! - The SQLite connection and schema (`db`)
//! - `VaultItemStore` for community-scoped CRUD and access counters (`store`)

pub mod db;
pub mod item;
pub mod store;

// Re-export the most commonly used items.
pub use db::Database;
pub use item::{
    FieldChange, ItemState, ItemUpdate, NewVaultItem, RevealedItem, VaultItem, VaultItemSummary,
};
pub use store::VaultItemStore;
