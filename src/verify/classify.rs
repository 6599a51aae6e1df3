use std::fmt;

use phf::phf_set;

static FREE_PROVIDERS: phf::Set<&'static str> = phf_set! {
    "gmail.com", "yahoo.com", "outlook.com", "hotmail.com",
    "icloud.com", "aol.com", "zoho.com", "yandex.com",
};

static DISPOSABLE_PROVIDERS: phf::Set<&'static str> = phf_set! {
    "tempmail.com", "mailinator.com", "guerrillamail.com", "10minutemail.com",
};

static ROLE_PREFIXES: phf::Set<&'static str> = phf_set! {
    "info", "admin", "sales", "support", "contact", "hr", "help", "team",
};

const GOVERNMENT_SUFFIXES: &[&str] = &[".gov", ".gov.pk"];

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailType {
    Free,
    Disposable,
    Government,
    Role,
    Business,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Disposable => "disposable",
            Self::Government => "government",
            Self::Role => "role",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First match wins: free provider, disposable domain, government domain,
/// role local part, business.
pub fn classify(local: &str, domain: &str) -> EmailType {
    let domain = domain.to_ascii_lowercase();
    let local = local.to_ascii_lowercase();

    if FREE_PROVIDERS.contains(domain.as_str()) {
        EmailType::Free
    } else if DISPOSABLE_PROVIDERS
        .iter()
        .any(|provider| domain.ends_with(provider))
    {
        EmailType::Disposable
    } else if GOVERNMENT_SUFFIXES
        .iter()
        .any(|suffix| domain.ends_with(suffix))
    {
        EmailType::Government
    } else if ROLE_PREFIXES
        .iter()
        .any(|prefix| local.starts_with(prefix))
    {
        EmailType::Role
    } else {
        EmailType::Business
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_provider_wins_over_role_prefix() {
        assert_eq!(classify("info", "Gmail.com"), EmailType::Free);
    }

    #[test]
    fn disposable_matches_by_suffix() {
        assert_eq!(classify("x", "eu.mailinator.com"), EmailType::Disposable);
    }

    #[test]
    fn government_suffixes() {
        assert_eq!(classify("jane", "irs.gov"), EmailType::Government);
        assert_eq!(classify("support", "fbr.gov.pk"), EmailType::Government);
    }

    #[test]
    fn role_prefix_on_business_domain() {
        assert_eq!(classify("Support", "acme.io"), EmailType::Role);
        assert_eq!(classify("sales-emea", "acme.io"), EmailType::Role);
    }

    #[test]
    fn everything_else_is_business() {
        assert_eq!(classify("jane.doe", "acme.io"), EmailType::Business);
    }
}
