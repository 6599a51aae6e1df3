use std::fmt;

use crate::analysis::Analysis;
use crate::mx::MxProvider;

use super::classify::EmailType;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Deliverable,
    Undeliverable,
    Unknown,
    Error,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deliverable => "deliverable",
            Self::Undeliverable => "undeliverable",
            Self::Unknown => "unknown",
            Self::Error => "error",
        })
    }
}

/// Why the verifier reached its verdict.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reasoning {
    #[cfg_attr(feature = "with-serde", serde(rename = "250_ok"))]
    Accepted,
    #[cfg_attr(feature = "with-serde", serde(rename = "550_hard_fail"))]
    HardFail,
    #[cfg_attr(feature = "with-serde", serde(rename = "smtp_error"))]
    SmtpError,
    #[cfg_attr(feature = "with-serde", serde(rename = "no_mx"))]
    NoMx,
    #[cfg_attr(feature = "with-serde", serde(rename = "bad_syntax"))]
    BadSyntax,
    #[cfg_attr(feature = "with-serde", serde(rename = "internal_error"))]
    InternalError,
}

impl Reasoning {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "250_ok",
            Self::HardFail => "550_hard_fail",
            Self::SmtpError => "smtp_error",
            Self::NoMx => "no_mx",
            Self::BadSyntax => "bad_syntax",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for Reasoning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The real probe as the exchanger answered it.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SmtpSnapshot {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub latency_ms: Option<f64>,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub email: String,
    pub status: VerificationStatus,
    pub deliverable: bool,
    pub score: f32,
    pub mx_provider: MxProvider,
    pub mx_records: Vec<String>,
    pub email_type: Option<EmailType>,
    pub catch_all: Option<bool>,
    pub reasoning: Reasoning,
    pub detail: Option<String>,
    pub smtp: SmtpSnapshot,
    pub analysis: Option<Analysis>,
}

impl VerificationResult {
    /// An undeliverable verdict with nothing probed yet.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: VerificationStatus::Undeliverable,
            deliverable: false,
            score: 0.0,
            mx_provider: MxProvider::Unknown,
            mx_records: Vec::new(),
            email_type: None,
            catch_all: None,
            reasoning: Reasoning::SmtpError,
            detail: None,
            smtp: SmtpSnapshot::default(),
            analysis: None,
        }
    }

    pub fn internal_error(email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::Error,
            reasoning: Reasoning::InternalError,
            detail: Some(message.into()),
            ..Self::new(email)
        }
    }

    /// `"<reasoning>"` or `"<reasoning> | <detail>"`.
    pub fn reason(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{} | {detail}", self.reasoning),
            None => self.reasoning.to_string(),
        }
    }

    /// Deliverable on an exchanger that rejected the decoys.
    pub fn is_confident_hit(&self) -> bool {
        self.deliverable && self.catch_all == Some(false)
    }

    pub fn average_latency_ms(&self) -> Option<f64> {
        self.analysis
            .as_ref()
            .and_then(|analysis| analysis.average_latency_ms)
    }

    pub fn is_free_provider(&self) -> bool {
        self.email_type == Some(EmailType::Free)
    }

    pub fn is_disposable(&self) -> bool {
        self.email_type == Some(EmailType::Disposable)
    }

    pub fn is_role_based(&self) -> bool {
        self.email_type == Some(EmailType::Role)
    }

    pub fn is_government(&self) -> bool {
        self.email_type == Some(EmailType::Government)
    }
}
