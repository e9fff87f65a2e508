//! Domain model for the item registry.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every persisted item is identified by a storage-assigned `ItemId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod item;
