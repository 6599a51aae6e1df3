use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MxError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("domain IDNA conversion failed")]
    IdnaConversion {
        #[source]
        source: idna::Errors,
    },
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    #[error("MX lookup failed: {source}")]
    Lookup {
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    #[error("MX lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("no mail exchanger for {domain}")]
    NoMailExchanger { domain: String },
}

impl MxError {
    pub(crate) fn idna(source: idna::Errors) -> Self {
        Self::IdnaConversion { source }
    }

    pub(crate) fn resolver_init(source: trust_dns_resolver::error::ResolveError) -> Self {
        Self::ResolverInit { source }
    }

    pub(crate) fn lookup(source: trust_dns_resolver::error::ResolveError) -> Self {
        Self::Lookup { source }
    }

    pub(crate) fn no_mail_exchanger(domain: impl Into<String>) -> Self {
        Self::NoMailExchanger {
            domain: domain.into(),
        }
    }

    /// Resolver construction failures are configuration problems, not a
    /// verdict about the domain.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, Self::ResolverInit { .. })
    }
}
