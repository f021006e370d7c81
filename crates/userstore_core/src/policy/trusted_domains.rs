//! Email domain allow-list.

use std::collections::BTreeSet;

/// Answers whether an email domain is allowed for registration.
pub trait TrustedDomains {
    fn is_domain_trusted(&self, domain: &str) -> bool;
}

impl<T: TrustedDomains + ?Sized> TrustedDomains for &T {
    fn is_domain_trusted(&self, domain: &str) -> bool {
        (**self).is_domain_trusted(domain)
    }
}

/// Exact-match domain allow-list, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedDomainList {
    domains: BTreeSet<String>,
}

impl TrustedDomainList {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|domain| normalize_domain(domain.as_ref()))
            .filter(|domain| !domain.is_empty())
            .collect();
        Self { domains }
    }

    /// Returns sorted, normalized domains.
    pub fn domains(&self) -> Vec<String> {
        self.domains.iter().cloned().collect()
    }
}

impl TrustedDomains for TrustedDomainList {
    fn is_domain_trusted(&self, domain: &str) -> bool {
        self.domains.contains(&normalize_domain(domain))
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}
