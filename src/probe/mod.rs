//! SMTP recipient probing.
//!
//! [`probe_mailbox`] opens one session against an exchanger and checks three
//! recipients in order: a random decoy, the real address, a second random
//! decoy. The decoys calibrate whether an accepting reply for the real
//! address means anything. Transport failures never escape: they are folded
//! into the returned [`ProbeSequence`]. After a failed `RCPT TO` the
//! remaining recipients are recorded as not checked rather than sent on a
//! desynchronised session.

mod error;
mod options;
mod session;
mod transport;
mod types;
mod util;

pub use error::ProbeError;
pub use options::ProbeOptions;
pub use session::SmtpSession;
pub use transport::{Connector, MailTransport, TcpConnector};
pub use types::{CONNECT_SENTINEL, ProbeRecord, ProbeSequence, ProbeStage, SmtpReply};
pub use util::{decoy_address, random_local_part};

use util::elapsed_ms;

/// Run the decoy / real / decoy sequence for `target` against `exchanger`.
pub async fn probe_mailbox<C>(
    connector: &C,
    exchanger: &str,
    target: &str,
    options: &ProbeOptions,
) -> ProbeSequence
where
    C: Connector + ?Sized,
{
    let domain = target
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .unwrap_or(target);

    let mut transport = match open_session(connector, exchanger, options).await {
        Ok(transport) => transport,
        Err(err) => {
            tracing::error!(email = %target, mx = %exchanger, "SMTP connection error: {err}");
            return ProbeSequence::aborted(&err);
        }
    };
    tracing::debug!(email = %target, mx = %exchanger, "SMTP connected");

    let mut failure = None;
    let decoy_before = check_recipient(
        &mut transport,
        target,
        &decoy_address(domain, options.decoy_len),
        options,
        &mut failure,
    )
    .await;
    let real = check_recipient(&mut transport, target, target, options, &mut failure).await;
    let decoy_after = check_recipient(
        &mut transport,
        target,
        &decoy_address(domain, options.decoy_len),
        options,
        &mut failure,
    )
    .await;

    match transport.close().await {
        Ok(()) => tracing::debug!(email = %target, "SMTP session closed"),
        Err(err) => tracing::debug!(email = %target, "SMTP session closed uncleanly: {err}"),
    }

    ProbeSequence::Complete {
        decoy_before,
        real,
        decoy_after,
    }
}

async fn open_session<C>(
    connector: &C,
    exchanger: &str,
    options: &ProbeOptions,
) -> Result<C::Transport, ProbeError>
where
    C: Connector + ?Sized,
{
    let mut transport = connector.connect(exchanger, options).await?;

    let helo = transport.greet(options.helo_name()).await;
    if let Err(err) = expect_positive(helo, ProbeStage::Helo) {
        transport.close().await.ok();
        return Err(err);
    }

    let sender = transport.declare_sender(&options.mail_from()).await;
    if let Err(err) = expect_positive(sender, ProbeStage::MailFrom) {
        transport.close().await.ok();
        return Err(err);
    }

    Ok(transport)
}

fn expect_positive(
    reply: Result<SmtpReply, ProbeError>,
    stage: ProbeStage,
) -> Result<SmtpReply, ProbeError> {
    let reply = reply?;
    if reply.is_positive_completion() {
        Ok(reply)
    } else {
        Err(ProbeError::Rejected {
            stage,
            code: reply.code,
            message: reply.message,
        })
    }
}

/// Send one `RCPT TO`, unless an earlier one already failed; `failure`
/// carries that first cause forward.
async fn check_recipient<T>(
    transport: &mut T,
    target: &str,
    address: &str,
    options: &ProbeOptions,
    failure: &mut Option<String>,
) -> ProbeRecord
where
    T: MailTransport + ?Sized,
{
    if let Some(cause) = failure.as_deref() {
        tracing::debug!(email = %target, rcpt = %address, "RCPT skipped after: {cause}");
        return ProbeRecord::skipped(address, cause);
    }

    let started = tokio::time::Instant::now();
    let outcome = transport.check_recipient(address).await;
    let latency = elapsed_ms(started);

    let record = match outcome {
        Ok(reply) => ProbeRecord::from_reply(address, reply, latency),
        Err(err) => {
            *failure = Some(err.to_string());
            ProbeRecord::failed(address, &err, latency)
        }
    };
    tracing::debug!(
        email = %target,
        rcpt = %address,
        code = ?record.code,
        latency_ms = latency,
        "RCPT test: {}",
        record.message.chars().take(120).collect::<String>()
    );

    let pause = options.pause();
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
    record
}

#[cfg(test)]
pub(crate) mod tests;
