//! Ordered rule checks gating every user write.
//!
//! # Responsibility
//! - Reject a user on the first violated rule with a stable reason.
//! - Delegate name/domain policy to injected capabilities.
//!
//! # Invariants
//! - Rules run in a fixed order and short-circuit; errors never accumulate.
//! - Validation has no side effects.

use crate::model::user::User;
use crate::policy::{ProhibitedWords, TrustedDomains};
use email_address::{EmailAddress, Options};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum user name length, in characters.
pub const MIN_NAME_LENGTH: usize = 8;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+$").expect("valid name regex"));

/// The rule a user violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    NameRequired,
    EmailRequired,
    NameTooShort,
    NameInvalidCharacters,
    EmailInvalid,
    NameProhibited,
    EmailDomainUntrusted,
    DeletedBeforeCreated,
}

impl ValidationError {
    /// Human-readable rejection reason.
    pub fn reason(self) -> &'static str {
        match self {
            Self::NameRequired => "Name is required",
            Self::EmailRequired => "Email is required",
            Self::NameTooShort => "Name must be at least 8 characters long",
            Self::NameInvalidCharacters => {
                "Name can only contain lowercase alphanumeric characters"
            }
            Self::EmailInvalid => "Email must be a valid email",
            Self::NameProhibited => "Name contains prohibited words",
            Self::EmailDomainUntrusted => "Email must be on trusted domain",
            Self::DeletedBeforeCreated => "Deleted time must be >= created time",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

impl Error for ValidationError {}

/// Guard invoked before a user is written.
pub trait UserValidator {
    fn validate(&self, user: &User) -> Result<(), ValidationError>;
}

impl<V: UserValidator + ?Sized> UserValidator for &V {
    fn validate(&self, user: &User) -> Result<(), ValidationError> {
        (**self).validate(user)
    }
}

/// Standard account rules backed by policy capabilities.
pub struct DefaultUserValidator<P, T> {
    prohibited_words: P,
    trusted_domains: T,
}

impl<P: ProhibitedWords, T: TrustedDomains> DefaultUserValidator<P, T> {
    pub fn new(prohibited_words: P, trusted_domains: T) -> Self {
        Self {
            prohibited_words,
            trusted_domains,
        }
    }
}

impl<P: ProhibitedWords, T: TrustedDomains> UserValidator for DefaultUserValidator<P, T> {
    fn validate(&self, user: &User) -> Result<(), ValidationError> {
        if user.name.is_empty() {
            return Err(ValidationError::NameRequired);
        }
        if user.email.is_empty() {
            return Err(ValidationError::EmailRequired);
        }
        if user.name.chars().count() < MIN_NAME_LENGTH {
            return Err(ValidationError::NameTooShort);
        }
        if !NAME_RE.is_match(&user.name) {
            return Err(ValidationError::NameInvalidCharacters);
        }
        if !is_valid_email(&user.email) {
            return Err(ValidationError::EmailInvalid);
        }
        if self.prohibited_words.has_prohibited_words(&user.name) {
            return Err(ValidationError::NameProhibited);
        }
        let domain = user.email_domain().unwrap_or_default();
        if !self.trusted_domains.is_domain_trusted(domain) {
            return Err(ValidationError::EmailDomainUntrusted);
        }
        if let Some(deleted) = user.deleted {
            if deleted < user.created {
                return Err(ValidationError::DeletedBeforeCreated);
            }
        }
        Ok(())
    }
}

/// Bare `local@domain.tld` addresses only: no display text, no domain
/// literals, no whitespace (even quoted).
fn is_valid_email(email: &str) -> bool {
    let options = Options::default()
        .without_display_text()
        .without_domain_literal()
        .with_required_tld();
    !email.chars().any(char::is_whitespace)
        && EmailAddress::parse_with_options(email, options).is_ok()
}
