use std::fmt;

use crate::mx::MxProvider;
use crate::verify::VerificationResult;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderStatus {
    Found,
    NotFound,
    InvalidDomain,
    Error,
}

impl fmt::Display for FinderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::InvalidDomain => "invalid_domain",
            Self::Error => "error",
        })
    }
}

/// One probed candidate, as shown in the report's debug trail.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTrace {
    pub email: String,
    pub code: Option<u16>,
    pub latency_ms: Option<f64>,
    pub deliverable: bool,
    pub reason: String,
    pub mx_provider: MxProvider,
}

impl From<&VerificationResult> for CandidateTrace {
    fn from(result: &VerificationResult) -> Self {
        Self {
            email: result.email.clone(),
            code: result.smtp.code,
            latency_ms: result.smtp.latency_ms,
            deliverable: result.deliverable,
            reason: result.reason(),
            mx_provider: result.mx_provider,
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FinderReport {
    pub status: FinderStatus,
    pub valid: bool,
    pub email: Option<String>,
    pub smtp_code: Option<u16>,
    pub latency_ms: Option<f64>,
    pub reason: Option<String>,
    pub mx_provider: Option<MxProvider>,
    pub debug: Vec<CandidateTrace>,
}

impl FinderReport {
    pub fn invalid_domain() -> Self {
        Self {
            status: FinderStatus::InvalidDomain,
            valid: false,
            email: None,
            smtp_code: None,
            latency_ms: None,
            reason: None,
            mx_provider: None,
            debug: Vec::new(),
        }
    }

    pub(crate) fn found(chosen: &VerificationResult, debug: Vec<CandidateTrace>) -> Self {
        Self {
            status: FinderStatus::Found,
            valid: true,
            email: Some(chosen.email.clone()),
            smtp_code: chosen.smtp.code,
            latency_ms: chosen.smtp.latency_ms,
            reason: Some(chosen.reason()),
            mx_provider: Some(chosen.mx_provider),
            debug,
        }
    }

    pub(crate) fn not_found(debug: Vec<CandidateTrace>) -> Self {
        Self {
            status: FinderStatus::NotFound,
            debug,
            ..Self::invalid_domain()
        }
    }

    /// Nothing could be probed at all, e.g. the resolver is unusable.
    pub fn error(message: impl Into<String>, debug: Vec<CandidateTrace>) -> Self {
        Self {
            status: FinderStatus::Error,
            reason: Some(message.into()),
            debug,
            ..Self::invalid_domain()
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == FinderStatus::Found
    }
}
