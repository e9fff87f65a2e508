//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract consumed by the item service.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Item::validate()` before persistence.
//! - Code uniqueness is also enforced at storage level, so concurrent creates
//!   that both pass the service check cannot both land.

pub mod item_repo;
pub mod memory_repo;
