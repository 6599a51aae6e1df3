use std::future::Future;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use super::error::ProbeError;
use super::transport::MailTransport;
use super::types::{ProbeStage, SmtpReply};

/// A plain-text SMTP client connection. Every read and write is bounded by
/// the session timeout.
///
/// Once a command fails at the transport level (timeout, I/O, garbled
/// reply) the stream position is unknown and a late reply could be read as
/// the answer to the next command, so the session refuses further commands.
pub struct SmtpSession {
    host: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    timeout: Option<Duration>,
    broken: bool,
}

impl SmtpSession {
    /// Connect to `host:port` and consume the server banner.
    pub async fn connect(
        host: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> Result<(Self, SmtpReply), ProbeError> {
        let stream = with_deadline(ProbeStage::Connect, timeout, async {
            TcpStream::connect((host, port))
                .await
                .map_err(|source| ProbeError::Connect {
                    host: host.to_string(),
                    source,
                })
        })
        .await?;
        let (read_half, write_half) = stream.into_split();
        let mut session = Self {
            host: host.to_string(),
            reader: BufReader::new(read_half),
            writer: write_half,
            timeout,
            broken: false,
        };
        let banner = with_deadline(
            ProbeStage::Greeting,
            timeout,
            session.read_reply(ProbeStage::Greeting),
        )
        .await?;
        tracing::trace!(host = %session.host, code = banner.code, "S: banner");
        Ok((session, banner))
    }

    pub async fn send_command(
        &mut self,
        command: &str,
        stage: ProbeStage,
    ) -> Result<SmtpReply, ProbeError> {
        if self.broken {
            return Err(ProbeError::protocol(format!(
                "session unusable, {stage} not sent"
            )));
        }
        tracing::trace!(host = %self.host, "C: {command}");
        let timeout = self.timeout;
        let outcome = with_deadline(stage, timeout, async {
            let mut line = command.as_bytes().to_vec();
            line.extend_from_slice(b"\r\n");
            self.writer
                .write_all(&line)
                .await
                .map_err(|err| ProbeError::io(stage, err))?;
            self.writer
                .flush()
                .await
                .map_err(|err| ProbeError::io(stage, err))?;
            self.read_reply(stage).await
        })
        .await;
        if outcome.is_err() {
            self.broken = true;
        }
        let reply = outcome?;
        tracing::trace!(host = %self.host, code = reply.code, "S: {}", reply.message);
        Ok(reply)
    }

    async fn read_reply(&mut self, stage: ProbeStage) -> Result<SmtpReply, ProbeError> {
        let mut code = None;
        let mut message_lines = Vec::new();
        loop {
            let mut raw = String::new();
            let bytes = self
                .reader
                .read_line(&mut raw)
                .await
                .map_err(|err| ProbeError::io(stage, err))?;
            if bytes == 0 {
                return Err(ProbeError::io(
                    stage,
                    io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed while reading reply",
                    ),
                ));
            }
            let line = raw.trim_end_matches(['\r', '\n']);

            let parsed_code = line
                .get(..3)
                .and_then(|part| part.parse::<u16>().ok())
                .ok_or_else(|| ProbeError::protocol(format!("invalid SMTP reply: '{line}'")))?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(ProbeError::protocol(format!(
                        "inconsistent SMTP reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            let continuation = line.as_bytes().get(3).copied() == Some(b'-');
            message_lines.push(line.get(4..).unwrap_or_default().to_string());
            if !continuation {
                break;
            }
        }
        let code =
            code.ok_or_else(|| ProbeError::protocol("SMTP reply missing status code"))?;
        Ok(SmtpReply::new(code, message_lines.join("\n")))
    }
}

#[async_trait]
impl MailTransport for SmtpSession {
    async fn greet(&mut self, identity: &str) -> Result<SmtpReply, ProbeError> {
        self.send_command(&format!("HELO {identity}"), ProbeStage::Helo)
            .await
    }

    async fn declare_sender(&mut self, address: &str) -> Result<SmtpReply, ProbeError> {
        self.send_command(&format!("MAIL FROM:<{address}>"), ProbeStage::MailFrom)
            .await
    }

    async fn check_recipient(&mut self, address: &str) -> Result<SmtpReply, ProbeError> {
        self.send_command(&format!("RCPT TO:<{address}>"), ProbeStage::RcptTo)
            .await
    }

    async fn close(&mut self) -> Result<(), ProbeError> {
        if self.broken {
            let _ = self.writer.shutdown().await;
            return Ok(());
        }
        let quit = self.send_command("QUIT", ProbeStage::Quit).await;
        let _ = self.writer.shutdown().await;
        quit.map(|_| ())
    }
}

async fn with_deadline<T, F>(
    stage: ProbeStage,
    timeout: Option<Duration>,
    fut: F,
) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ProbeError::Timeout {
                stage,
                timeout: limit,
            })?,
        None => fut.await,
    }
}
