//! Single-candidate verification: syntax, classification, MX lookup, probe
//! session and catch-all analysis folded into one [`VerificationResult`].
//!
//! The verifier never fails. Every network or protocol problem ends up in
//! the result's `reasoning`/`detail` fields.

mod classify;
mod syntax;
mod types;

pub use classify::{EmailType, classify};
pub use syntax::parse_address;
pub use types::{Reasoning, SmtpSnapshot, VerificationResult, VerificationStatus};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use crate::analysis::{Analysis, AnalyzerOptions, analyze_with};
use crate::mx::{CachingResolver, LookupMx, MxError, MxProvider, SystemResolver, resolve_exchangers};
use crate::probe::{Connector, ProbeOptions, ProbeSequence, TcpConnector, probe_mailbox};

const SCORE_CONFIRMED: f32 = 0.98;
const SCORE_CATCH_ALL: f32 = 0.85;

/// Candidate → verdict. The bulk coordinator is generic over this so it can
/// share one verifier between tasks.
#[async_trait]
pub trait Verify: Send + Sync + 'static {
    async fn verify(&self, candidate: &str) -> VerificationResult;
}

pub struct Verifier<R, C> {
    resolver: R,
    connector: C,
    options: ProbeOptions,
    analyzer: AnalyzerOptions,
    ambiguous_as_unknown: bool,
}

/// Verifier wired to the system resolver (cached per domain) and plain TCP.
pub type SystemVerifier = Verifier<CachingResolver<SystemResolver>, TcpConnector>;

impl SystemVerifier {
    pub fn system(options: ProbeOptions) -> Result<Self, MxError> {
        let timeout = options.timeout().unwrap_or(std::time::Duration::from_secs(30));
        let resolver = CachingResolver::new(SystemResolver::from_system_conf(timeout)?);
        Ok(Verifier::new(resolver, TcpConnector, options))
    }
}

impl<R, C> Verifier<R, C>
where
    R: LookupMx,
    C: Connector,
{
    pub fn new(resolver: R, connector: C, options: ProbeOptions) -> Self {
        Self {
            resolver,
            connector,
            options,
            analyzer: AnalyzerOptions::default(),
            ambiguous_as_unknown: false,
        }
    }

    pub fn with_analyzer(mut self, analyzer: AnalyzerOptions) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Report codes other than 250/550 as `unknown` instead of
    /// `undeliverable`. Either way they are not deliverable.
    pub fn report_ambiguous_as_unknown(mut self, enabled: bool) -> Self {
        self.ambiguous_as_unknown = enabled;
        self
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn verify(&self, candidate: &str) -> VerificationResult {
        let span = tracing::debug_span!("verify", email = %candidate.trim());
        self.verify_inner(candidate.trim()).instrument(span).await
    }

    async fn verify_inner(&self, email: &str) -> VerificationResult {
        let mut result = VerificationResult::new(email);

        let Some((local, domain)) = parse_address(email) else {
            tracing::warn!(email, "bad syntax detected");
            result.reasoning = Reasoning::BadSyntax;
            return result;
        };
        result.email_type = Some(classify(local, domain));

        let exchangers = match resolve_exchangers(&self.resolver, domain).await {
            Ok(exchangers) => exchangers,
            Err(err) if err.is_misconfiguration() => {
                tracing::error!(email, "resolver unavailable: {err}");
                return VerificationResult {
                    email_type: result.email_type,
                    ..VerificationResult::internal_error(email, err.to_string())
                };
            }
            Err(err) => {
                tracing::error!(email, "MX lookup failed: {err}");
                result.reasoning = Reasoning::NoMx;
                result.detail = Some(err.to_string());
                return result;
            }
        };
        let Some(primary) = exchangers.first().cloned() else {
            result.reasoning = Reasoning::NoMx;
            return result;
        };
        result.mx_provider = MxProvider::detect(&primary);
        result.mx_records = exchangers;
        tracing::debug!(email, mx = %primary, provider = %result.mx_provider, "MX resolved");

        let sequence = probe_mailbox(&self.connector, &primary, email, &self.options).await;
        let analysis = analyze_with(&sequence, &self.analyzer);
        self.decide(result, &sequence, analysis)
    }

    fn decide(
        &self,
        mut result: VerificationResult,
        sequence: &ProbeSequence,
        analysis: Analysis,
    ) -> VerificationResult {
        let record = sequence.primary_record();
        result.smtp.code = analysis.real_code;
        result.smtp.message = Some(record.message.clone());
        result.smtp.latency_ms = record.latency_ms;
        result.catch_all = analysis.is_catch_all;

        match (analysis.real_code, analysis.is_catch_all) {
            (Some(250), Some(catch_all)) => {
                result.status = VerificationStatus::Deliverable;
                result.deliverable = true;
                result.score = if catch_all {
                    SCORE_CATCH_ALL
                } else {
                    SCORE_CONFIRMED
                };
                result.reasoning = Reasoning::Accepted;
                tracing::info!(email = %result.email, catch_all, "deliverable (code 250)");
            }
            (Some(250), None) => {
                result.status = self.ambiguous_status();
                result.reasoning = Reasoning::SmtpError;
                result.detail = Some("catch-all undetermined".to_string());
                tracing::warn!(
                    email = %result.email,
                    "accepted but a decoy check failed; catch-all undetermined"
                );
            }
            (Some(550), _) => {
                result.status = VerificationStatus::Undeliverable;
                result.reasoning = Reasoning::HardFail;
                tracing::info!(email = %result.email, "undeliverable (550)");
            }
            (code, _) => {
                result.status = self.ambiguous_status();
                result.reasoning = Reasoning::SmtpError;
                if sequence.is_aborted() {
                    result.detail = Some(record.message.clone());
                }
                tracing::warn!(
                    email = %result.email,
                    code = ?code,
                    message = %record.message,
                    "SMTP uncertain"
                );
            }
        }

        result.analysis = Some(analysis);
        result
    }

    fn ambiguous_status(&self) -> VerificationStatus {
        if self.ambiguous_as_unknown {
            VerificationStatus::Unknown
        } else {
            VerificationStatus::Undeliverable
        }
    }
}

#[async_trait]
impl<R, C> Verify for Verifier<R, C>
where
    R: LookupMx + 'static,
    C: Connector + 'static,
{
    async fn verify(&self, candidate: &str) -> VerificationResult {
        Verifier::verify(self, candidate).await
    }
}

#[async_trait]
impl<V: Verify + ?Sized> Verify for Arc<V> {
    async fn verify(&self, candidate: &str) -> VerificationResult {
        (**self).verify(candidate).await
    }
}
