use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use super::*;

/// What a scripted exchanger answers to one `RCPT TO`.
#[derive(Debug, Clone)]
pub(crate) enum Rcpt {
    Reply(u16, String),
    Fail(String),
}

type Responder = dyn Fn(&str) -> (Rcpt, Duration) + Send + Sync;

/// In-memory exchanger. Counts connections, closes and recipients so tests
/// can assert what went over the (fake) wire.
#[derive(Clone)]
pub(crate) struct ScriptedConnector {
    respond: Arc<Responder>,
    connect_error: Option<String>,
    sender_reply: (u16, String),
    pub connects: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub recipients: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub(crate) fn new<F>(respond: F) -> Self
    where
        F: Fn(&str) -> (Rcpt, Duration) + Send + Sync + 'static,
    {
        Self {
            respond: Arc::new(respond),
            connect_error: None,
            sender_reply: (250, "2.1.0 Sender OK".to_string()),
            connects: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            recipients: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Accepts every recipient with the same boilerplate.
    pub(crate) fn accept_all() -> Self {
        Self::new(|_| (Rcpt::Reply(250, "2.1.5 OK".to_string()), Duration::ZERO))
    }

    /// Accepts only the listed addresses; everything else is a 550 quoting
    /// the address back, the way most exchangers phrase it.
    pub(crate) fn mailboxes(existing: &[&str]) -> Self {
        let existing: Vec<String> = existing.iter().map(|s| s.to_string()).collect();
        Self::new(move |addr| {
            if existing.iter().any(|e| e == addr) {
                (
                    Rcpt::Reply(250, "2.1.5 Recipient OK".to_string()),
                    Duration::ZERO,
                )
            } else {
                (
                    Rcpt::Reply(550, format!("5.1.1 <{addr}>: Recipient address rejected")),
                    Duration::ZERO,
                )
            }
        })
    }

    pub(crate) fn refusing(cause: &str) -> Self {
        let mut connector = Self::accept_all();
        connector.connect_error = Some(cause.to_string());
        connector
    }

    pub(crate) fn with_sender_reply(mut self, code: u16, message: &str) -> Self {
        self.sender_reply = (code, message.to_string());
        self
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn recipients(&self) -> Vec<String> {
        self.recipients.lock().expect("recipients lock").clone()
    }
}

pub(crate) struct ScriptedTransport {
    connector: ScriptedConnector,
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    async fn greet(&mut self, _identity: &str) -> Result<SmtpReply, ProbeError> {
        Ok(SmtpReply::new(250, "mock.example Hello"))
    }

    async fn declare_sender(&mut self, _address: &str) -> Result<SmtpReply, ProbeError> {
        let (code, message) = self.connector.sender_reply.clone();
        Ok(SmtpReply::new(code, message))
    }

    async fn check_recipient(&mut self, address: &str) -> Result<SmtpReply, ProbeError> {
        self.connector
            .recipients
            .lock()
            .expect("recipients lock")
            .push(address.to_string());
        let (rcpt, delay) = (self.connector.respond)(address);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match rcpt {
            Rcpt::Reply(code, message) => Ok(SmtpReply::new(code, message)),
            Rcpt::Fail(cause) => Err(ProbeError::protocol(cause)),
        }
    }

    async fn close(&mut self) -> Result<(), ProbeError> {
        self.connector.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    async fn connect(
        &self,
        host: &str,
        _options: &ProbeOptions,
    ) -> Result<Self::Transport, ProbeError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(cause) = &self.connect_error {
            return Err(ProbeError::Connect {
                host: host.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, cause.clone()),
            });
        }
        Ok(ScriptedTransport {
            connector: self.clone(),
        })
    }
}

pub(crate) fn quick_options() -> ProbeOptions {
    ProbeOptions {
        pause_ms: 0,
        timeout_ms: 2_000,
        ..ProbeOptions::default()
    }
}

#[tokio::test]
async fn sequence_frames_real_between_two_decoys() {
    let connector = ScriptedConnector::mailboxes(&["jane@example.com"]);
    let sequence = probe_mailbox(
        &connector,
        "mx.example.com",
        "jane@example.com",
        &quick_options(),
    )
    .await;

    let ProbeSequence::Complete {
        decoy_before,
        real,
        decoy_after,
    } = &sequence
    else {
        panic!("expected a complete sequence, got {sequence:?}");
    };
    assert_eq!(real.address, "jane@example.com");
    assert_eq!(real.code, Some(250));
    assert_eq!(decoy_before.code, Some(550));
    assert_eq!(decoy_after.code, Some(550));
    assert_ne!(decoy_before.address, decoy_after.address);
    for decoy in [decoy_before, decoy_after] {
        let (local, domain) = decoy.address.split_once('@').expect("decoy has @");
        assert_eq!(domain, "example.com");
        assert_eq!(local.len(), 8);
    }

    let sent = connector.recipients();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[1], "jane@example.com");
    assert_eq!(connector.close_count(), 1);
}

#[tokio::test]
async fn connect_failure_yields_single_synthetic_record() {
    let connector = ScriptedConnector::refusing("connection refused");
    let sequence = probe_mailbox(
        &connector,
        "mx.example.com",
        "jane@example.com",
        &quick_options(),
    )
    .await;

    let records = sequence.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].address, CONNECT_SENTINEL);
    assert_eq!(records[0].code, None);
    assert_eq!(records[0].latency_ms, None);
    assert!(records[0].message.starts_with("connect_error:"));
    assert!(connector.recipients().is_empty());
}

#[tokio::test]
async fn rejected_sender_aborts_and_closes() {
    let connector =
        ScriptedConnector::accept_all().with_sender_reply(554, "5.7.1 Sender blocked");
    let sequence = probe_mailbox(
        &connector,
        "mx.example.com",
        "jane@example.com",
        &quick_options(),
    )
    .await;

    assert!(sequence.is_aborted());
    assert!(sequence.primary_record().message.contains("554"));
    assert!(connector.recipients().is_empty());
    assert_eq!(connector.close_count(), 1);
}

#[tokio::test]
async fn recipient_failure_stops_the_session() {
    let connector = ScriptedConnector::new(|addr| {
        if addr == "jane@example.com" {
            (Rcpt::Fail("reset by peer".to_string()), Duration::ZERO)
        } else {
            (
                Rcpt::Reply(550, format!("5.1.1 <{addr}> unknown")),
                Duration::ZERO,
            )
        }
    });
    let sequence = probe_mailbox(
        &connector,
        "mx.example.com",
        "jane@example.com",
        &quick_options(),
    )
    .await;

    let records = sequence.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].code, Some(550));
    assert_eq!(records[1].code, None);
    assert!(records[1].message.contains("reset by peer"));
    assert!(records[1].latency_ms.is_some());
    assert_eq!(records[2].code, None);
    assert_eq!(records[2].latency_ms, None);
    assert!(records[2].message.starts_with("not checked:"));
    assert!(records[2].message.contains("reset by peer"));

    let sent = connector.recipients();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1], "jane@example.com");
    assert_eq!(connector.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn latency_is_measured_per_recipient() {
    let connector = ScriptedConnector::new(|addr| {
        let delay = if addr == "jane@example.com" { 300 } else { 40 };
        (
            Rcpt::Reply(250, "2.1.5 OK".to_string()),
            Duration::from_millis(delay),
        )
    });
    let options = ProbeOptions {
        pause_ms: 100,
        ..quick_options()
    };
    let sequence = probe_mailbox(&connector, "mx.example.com", "jane@example.com", &options).await;

    let records = sequence.records();
    let latencies: Vec<f64> = records
        .iter()
        .map(|r| r.latency_ms.expect("latency"))
        .collect();
    assert!((latencies[0] - 40.0).abs() < 1.0, "{latencies:?}");
    assert!((latencies[1] - 300.0).abs() < 1.0, "{latencies:?}");
    assert!((latencies[2] - 40.0).abs() < 1.0, "{latencies:?}");
}

async fn spawn_mock_server(
    script: Vec<(&'static str, &'static str)>,
) -> (u16, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let port = listener.local_addr().expect("addr").port();
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        let (stream, _) = listener.accept().await.expect("accept");
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        write_half
            .write_all(b"220 mock.smtp.test ESMTP\r\n")
            .await
            .expect("banner");
        for (expected, response) in script {
            let mut line = String::new();
            reader.read_line(&mut line).await.expect("read command");
            assert!(
                line.starts_with(expected),
                "expected command starting with '{expected}', got '{line}'"
            );
            seen.push(line.trim_end().to_string());
            write_half
                .write_all(response.as_bytes())
                .await
                .expect("reply");
        }
        seen
    });
    (port, handle)
}

#[tokio::test]
async fn tcp_session_speaks_helo_mail_rcpt_quit() {
    let (port, server) = spawn_mock_server(vec![
        ("HELO probe.test", "250 mock.example\r\n"),
        ("MAIL FROM:<probe@probe.test>", "250 2.1.0 Ok\r\n"),
        ("RCPT TO:<", "550 5.1.1 User unknown\r\n"),
        (
            "RCPT TO:<jane@example.com>",
            "250-2.1.5 Ok\r\n250 2.1.5 Recipient accepted\r\n",
        ),
        ("RCPT TO:<", "550 5.1.1 User unknown\r\n"),
        ("QUIT", "221 2.0.0 Bye\r\n"),
    ])
    .await;
    let options = ProbeOptions {
        helo_domain: "probe.test".to_string(),
        port,
        ..quick_options()
    };

    let sequence = probe_mailbox(&TcpConnector, "127.0.0.1", "jane@example.com", &options).await;
    let real = sequence.real().expect("complete sequence");
    assert_eq!(real.code, Some(250));
    assert_eq!(real.message, "2.1.5 Ok\n2.1.5 Recipient accepted");

    let seen = server.await.expect("server task");
    assert_eq!(seen.len(), 6);
    assert_eq!(seen[5], "QUIT");
}

#[tokio::test]
async fn tcp_late_reply_is_not_read_as_the_next_answer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        write_half
            .write_all(b"220 slow.smtp.test ESMTP\r\n")
            .await
            .expect("banner");

        let mut seen = Vec::new();
        let mut replies = ["250 slow.smtp.test\r\n", "250 2.1.0 Ok\r\n"].into_iter();
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            seen.push(line.trim_end().to_string());
            if line.starts_with("RCPT TO:") {
                tokio::time::sleep(Duration::from_millis(700)).await;
                let _ = write_half.write_all(b"550 5.1.1 decoy unknown\r\n").await;
            } else if let Some(reply) = replies.next() {
                let _ = write_half.write_all(reply.as_bytes()).await;
            }
        }
        seen
    });
    let options = ProbeOptions {
        helo_domain: "client.test".to_string(),
        port,
        timeout_ms: 500,
        ..quick_options()
    };

    let sequence = probe_mailbox(&TcpConnector, "127.0.0.1", "jane@example.com", &options).await;
    let ProbeSequence::Complete {
        decoy_before,
        real,
        decoy_after,
    } = &sequence
    else {
        panic!("expected a complete sequence, got {sequence:?}");
    };
    assert_eq!(decoy_before.code, None);
    assert!(decoy_before.message.contains("timed out"), "{}", decoy_before.message);
    assert_eq!(real.address, "jane@example.com");
    assert_eq!(real.code, None);
    assert!(real.message.starts_with("not checked:"));
    assert_eq!(decoy_after.code, None);

    let seen = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("client hung up")
        .expect("server task");
    let rcpts: Vec<&String> = seen.iter().filter(|c| c.starts_with("RCPT")).collect();
    assert_eq!(rcpts.len(), 1, "{seen:?}");
    assert!(!seen.iter().any(|c| c.contains("jane@example.com")));
    assert!(!seen.iter().any(|c| c == "QUIT"));
}

#[tokio::test]
async fn tcp_banner_rejection_aborts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        stream
            .write_all(b"554 5.7.1 No SMTP service here\r\n")
            .await
            .expect("banner");
        let mut rest = String::new();
        let mut reader = BufReader::new(stream);
        let _ = reader.read_line(&mut rest).await;
        rest
    });
    let options = ProbeOptions {
        port,
        ..quick_options()
    };

    let sequence = probe_mailbox(&TcpConnector, "127.0.0.1", "jane@example.com", &options).await;
    assert!(sequence.is_aborted());
    assert!(sequence.primary_record().message.contains("554"));
    let after_banner = server.await.expect("server task");
    assert!(after_banner.starts_with("QUIT"));
}

#[tokio::test]
async fn tcp_connect_refused_is_aborted_sequence() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    let options = ProbeOptions {
        port,
        ..quick_options()
    };

    let sequence = probe_mailbox(&TcpConnector, "127.0.0.1", "jane@example.com", &options).await;
    assert!(sequence.is_aborted());
    assert!(
        sequence
            .primary_record()
            .message
            .starts_with("connect_error:")
    );
}
