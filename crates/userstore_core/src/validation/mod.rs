//! Write-path validation rules.

pub mod user_validator;

pub use user_validator::{DefaultUserValidator, UserValidator, ValidationError, MIN_NAME_LENGTH};
