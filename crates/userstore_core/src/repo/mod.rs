//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the user data-access contract.
//! - Isolate SQLite query details from callers.
//!
//! # Invariants
//! - Writes run the injected validator before persistence.
//! - Lookups return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod user_repo;
