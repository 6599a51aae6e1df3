use async_trait::async_trait;

use super::error::ProbeError;
use super::options::ProbeOptions;
use super::session::SmtpSession;
use super::types::{ProbeStage, SmtpReply};

/// An open mail-transport session. Implementations own exactly one
/// connection; they are never shared between candidates.
#[async_trait]
pub trait MailTransport: Send {
    async fn greet(&mut self, identity: &str) -> Result<SmtpReply, ProbeError>;
    async fn declare_sender(&mut self, address: &str) -> Result<SmtpReply, ProbeError>;
    async fn check_recipient(&mut self, address: &str) -> Result<SmtpReply, ProbeError>;
    async fn close(&mut self) -> Result<(), ProbeError>;
}

/// Opens sessions against an exchanger host. The returned transport has
/// already consumed a positive server banner.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: MailTransport;

    async fn connect(
        &self,
        host: &str,
        options: &ProbeOptions,
    ) -> Result<Self::Transport, ProbeError>;
}

/// Plain TCP SMTP on `options.port`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Transport = SmtpSession;

    async fn connect(
        &self,
        host: &str,
        options: &ProbeOptions,
    ) -> Result<Self::Transport, ProbeError> {
        let (mut session, banner) =
            SmtpSession::connect(host, options.port, options.timeout()).await?;
        if !banner.is_positive_completion() {
            session.close().await.ok();
            return Err(ProbeError::Rejected {
                stage: ProbeStage::Greeting,
                code: banner.code,
                message: banner.message,
            });
        }
        Ok(session)
    }
}
