use std::time::Duration;

use thiserror::Error;

use super::types::ProbeStage;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} timed out after {timeout:?}")]
    Timeout {
        stage: ProbeStage,
        timeout: Duration,
    },
    #[error("I/O error during {stage}: {source}")]
    Io {
        stage: ProbeStage,
        #[source]
        source: std::io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("{stage} rejected with {code} {message}")]
    Rejected {
        stage: ProbeStage,
        code: u16,
        message: String,
    },
}

impl ProbeError {
    pub(crate) fn io(stage: ProbeStage, source: std::io::Error) -> Self {
        Self::Io { stage, source }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}
