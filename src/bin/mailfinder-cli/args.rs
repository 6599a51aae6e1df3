use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use mailfinder_lib::{BatchOptions, ProbeOptions, SelectionPolicy};

#[derive(Parser, Debug)]
#[command(name = "mailfinder-cli", version, about = "Find and verify e-mail addresses over SMTP")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,

    /// output format: human|json
    #[arg(long, global = true, default_value = "human")]
    pub format: String,

    /// maximum simultaneous SMTP sessions
    #[arg(long, global = true, default_value_t = 10)]
    pub concurrency: usize,

    /// network timeout per operation (ms, 0 disables)
    #[arg(long = "timeout", global = true, default_value_t = 5_000)]
    pub timeout_ms: u64,

    /// pause between recipient checks (ms)
    #[arg(long = "pause", global = true, default_value_t = 100)]
    pub pause_ms: u64,

    /// name announced in HELO
    #[arg(long, global = true)]
    pub helo: Option<String>,

    /// envelope sender (default probe@<helo>)
    #[arg(long = "from", global = true)]
    pub mail_from: Option<String>,

    /// dispatch candidates in groups of this size
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// report greylisting and other non 250/550 replies as unknown
    #[arg(long, global = true)]
    pub ambiguous_unknown: bool,

    /// debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify a single address
    Verify { email: String },
    /// Verify a list of addresses and pick one
    Batch {
        /// read addresses from stdin (one per line)
        #[arg(long)]
        stdin: bool,
        /// selection policy: first|exhaustive
        #[arg(long, default_value = "first")]
        policy: String,
        emails: Vec<String>,
    },
    /// Guess the address of a person at a domain
    Find {
        #[arg(long)]
        first: String,
        #[arg(long, default_value = "")]
        last: String,
        #[arg(long)]
        domain: String,
        /// selection policy: first|exhaustive
        #[arg(long, default_value = "exhaustive")]
        policy: String,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn probe_options(&self) -> ProbeOptions {
        let mut options = ProbeOptions {
            timeout_ms: self.timeout_ms,
            pause_ms: self.pause_ms,
            ..ProbeOptions::default()
        };
        if let Some(helo) = &self.helo {
            options.helo_domain = helo.clone();
        }
        if let Some(from) = &self.mail_from {
            options.mail_from = from.clone();
        }
        options
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency: self.concurrency.max(1),
            chunk_size: self.chunk_size,
            ..BatchOptions::default()
        }
    }
}

pub fn policy_from_str(name: &str) -> Result<SelectionPolicy> {
    match SelectionPolicy::from_name(name) {
        Some(policy) => Ok(policy),
        None => bail!("unknown --policy '{name}', use: first|exhaustive"),
    }
}
