//! Account policy capabilities consulted by validation.
//!
//! # Responsibility
//! - Declare single-method capability traits for name and domain policy.
//! - Provide list-backed implementations configured at startup.
//!
//! # Invariants
//! - Policy checks are pure lookups with no side effects.

pub mod prohibited_words;
pub mod trusted_domains;

pub use prohibited_words::{ProhibitedWordList, ProhibitedWords};
pub use trusted_domains::{TrustedDomainList, TrustedDomains};
