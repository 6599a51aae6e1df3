use std::fmt;

use super::error::ProbeError;

/// Address recorded when the session never reached the recipient stage.
pub const CONNECT_SENTINEL: &str = "__connect__";

/// A raw SMTP reply, preserving the numeric status code and message text.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub message: String,
}

impl SmtpReply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Connect,
    Greeting,
    Helo,
    MailFrom,
    RcptTo,
    Quit,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Helo => "HELO",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Quit => "QUIT",
        })
    }
}

/// One recipient check (or the synthetic connect failure).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRecord {
    pub address: String,
    pub code: Option<u16>,
    pub message: String,
    pub latency_ms: Option<f64>,
}

impl ProbeRecord {
    pub fn from_reply(address: impl Into<String>, reply: SmtpReply, latency_ms: f64) -> Self {
        Self {
            address: address.into(),
            code: Some(reply.code),
            message: reply.message,
            latency_ms: Some(latency_ms),
        }
    }

    pub fn failed(address: impl Into<String>, err: &ProbeError, latency_ms: f64) -> Self {
        Self {
            address: address.into(),
            code: None,
            message: err.to_string(),
            latency_ms: Some(latency_ms),
        }
    }

    /// A recipient that was never sent because an earlier command left the
    /// session unusable.
    pub fn skipped(address: impl Into<String>, cause: &str) -> Self {
        Self {
            address: address.into(),
            code: None,
            message: format!("not checked: session unusable after {cause}"),
            latency_ms: None,
        }
    }

    pub fn connect_error(err: &ProbeError) -> Self {
        Self {
            address: CONNECT_SENTINEL.to_string(),
            code: None,
            message: format!("connect_error:{err}"),
            latency_ms: None,
        }
    }
}

/// The decoy / real / decoy framing of a single session.
///
/// `Aborted` carries the synthetic record produced when the session failed
/// before any recipient could be checked.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(tag = "outcome", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeSequence {
    Complete {
        decoy_before: ProbeRecord,
        real: ProbeRecord,
        decoy_after: ProbeRecord,
    },
    Aborted {
        record: ProbeRecord,
    },
}

impl ProbeSequence {
    pub fn aborted(err: &ProbeError) -> Self {
        Self::Aborted {
            record: ProbeRecord::connect_error(err),
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    /// Records in wire order.
    pub fn records(&self) -> Vec<&ProbeRecord> {
        match self {
            Self::Complete {
                decoy_before,
                real,
                decoy_after,
            } => vec![decoy_before, real, decoy_after],
            Self::Aborted { record } => vec![record],
        }
    }

    pub fn real(&self) -> Option<&ProbeRecord> {
        match self {
            Self::Complete { real, .. } => Some(real),
            Self::Aborted { .. } => None,
        }
    }

    /// The record that explains the verdict: the real probe, or the
    /// synthetic connect failure.
    pub fn primary_record(&self) -> &ProbeRecord {
        match self {
            Self::Complete { real, .. } => real,
            Self::Aborted { record } => record,
        }
    }
}
