//! Account domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by validation and persistence.
//!
//! # Invariants
//! - Users are identified by a storage-assigned integer id.
//! - Deletion is a timestamped tombstone unless hard-deleted.

pub mod user;
