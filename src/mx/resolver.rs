use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::error::ResolveErrorKind;

use super::{MxError, MxRecord};

/// Lookup the exchangers of `domain` and return their hostnames sorted by
/// ascending preference.
///
/// Hostnames are deduplicated; a null MX (`.`) does not count as an
/// exchanger.
pub async fn resolve_exchangers<R>(resolver: &R, domain: &str) -> Result<Vec<String>, MxError>
where
    R: LookupMx + ?Sized,
{
    let ascii = normalize_domain(domain)?;
    let mut records = resolver.lookup_mx(&ascii).await?;
    records.sort();

    let mut hosts: Vec<String> = Vec::with_capacity(records.len());
    for record in records {
        if record.exchange.is_empty() || hosts.contains(&record.exchange) {
            continue;
        }
        hosts.push(record.exchange);
    }

    if hosts.is_empty() {
        return Err(MxError::no_mail_exchanger(ascii));
    }
    tracing::debug!(domain = %ascii, exchangers = ?hosts, "MX lookup success");
    Ok(hosts)
}

pub fn normalize_domain(domain: &str) -> Result<String, MxError> {
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(MxError::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(MxError::idna)
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}

#[async_trait]
pub trait LookupMx: Send + Sync {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, MxError>;
}

/// MX lookups through the system resolver configuration.
pub struct SystemResolver {
    inner: TokioAsyncResolver,
    timeout: Duration,
}

impl SystemResolver {
    pub fn from_system_conf(timeout: Duration) -> Result<Self, MxError> {
        let inner = TokioAsyncResolver::tokio_from_system_conf().map_err(MxError::resolver_init)?;
        Ok(Self { inner, timeout })
    }
}

#[async_trait]
impl LookupMx for SystemResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, MxError> {
        let lookup = match tokio::time::timeout(self.timeout, self.inner.mx_lookup(domain)).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(err)) => {
                if matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
                    return Ok(Vec::new());
                }
                return Err(MxError::lookup(err));
            }
            Err(_) => return Err(MxError::Timeout(self.timeout)),
        };
        let records = lookup
            .iter()
            .map(|mx| MxRecord::new(mx.preference(), normalize_exchange(mx.exchange().to_utf8())))
            .collect();
        Ok(records)
    }
}

/// Memoises successful lookups per domain. Concurrent callers for the same
/// domain wait on a single in-flight query; failures are not cached.
pub struct CachingResolver<R> {
    inner: R,
    cells: Mutex<HashMap<String, Arc<OnceCell<Vec<MxRecord>>>>>,
}

impl<R> CachingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cells: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn cell(&self, domain: &str) -> Arc<OnceCell<Vec<MxRecord>>> {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cells.entry(domain.to_ascii_lowercase()).or_default())
    }
}

#[async_trait]
impl<R: LookupMx> LookupMx for CachingResolver<R> {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, MxError> {
        let cell = self.cell(domain);
        let records = cell
            .get_or_try_init(|| self.inner.lookup_mx(domain))
            .await?;
        Ok(records.clone())
    }
}

#[async_trait]
impl<R: LookupMx + ?Sized> LookupMx for Arc<R> {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, MxError> {
        (**self).lookup_mx(domain).await
    }
}

#[cfg(test)]
#[async_trait]
impl LookupMx for crate::mx::tests::StubResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, MxError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        (self.on_lookup)(domain)
    }
}
