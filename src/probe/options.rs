use std::borrow::Cow;
use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Configuration knobs for a probe session.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub helo_domain: String,
    pub mail_from: String,
    pub port: u16,
    pub timeout_ms: u64,
    pub pause_ms: u64,
    pub decoy_len: usize,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            helo_domain: "localhost".to_string(),
            mail_from: String::new(),
            port: 25,
            timeout_ms: 5_000,
            pause_ms: 100,
            decoy_len: 8,
        }
    }
}

impl ProbeOptions {
    /// Return the per-operation timeout. A zero timeout disables the
    /// deadline.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn helo_name(&self) -> &str {
        let trimmed = self.helo_domain.trim();
        if trimmed.is_empty() { "localhost" } else { trimmed }
    }

    /// Envelope sender for `MAIL FROM`; defaults to `probe@<helo>`.
    pub fn mail_from(&self) -> Cow<'_, str> {
        if self.mail_from.trim().is_empty() {
            Cow::Owned(format!("probe@{}", self.helo_name()))
        } else {
            Cow::Borrowed(self.mail_from.trim())
        }
    }
}
