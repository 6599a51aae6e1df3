use anyhow::{Context, Result, bail};
use std::io::{self, BufRead};

use mailfinder_lib::{
    BatchOutcome, BulkCoordinator, FinderReport, FinderStatus, SystemVerifier,
    VerificationResult, VerificationStatus, find_email_with,
};

mod args;
mod logging;
mod output;

use args::{Cli, Commands, policy_from_str};
use output::{OutputFormat, write_batch, write_finder, write_verification};

// exit codes: 0 found/deliverable, 2 not found, 1 fatal
const EXIT_OK: i32 = 0;
const EXIT_FATAL: i32 = 1;
const EXIT_NOT_FOUND: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let format = OutputFormat::parse(&cli.format)?;

    let code = run(&cli, format).await?;
    if code != EXIT_OK {
        std::process::exit(code);
    }
    Ok(())
}

async fn run(cli: &Cli, format: OutputFormat) -> Result<i32> {
    let verifier = SystemVerifier::system(cli.probe_options())
        .map(|verifier| verifier.report_ambiguous_as_unknown(cli.ambiguous_unknown));

    match &cli.cmd {
        Commands::Verify { email } => {
            let result = match &verifier {
                Ok(verifier) => verifier.verify(email).await,
                Err(err) => VerificationResult::internal_error(email.trim(), err.to_string()),
            };
            write_verification(&result, format)?;
            Ok(match result.status {
                VerificationStatus::Deliverable => EXIT_OK,
                VerificationStatus::Error => EXIT_FATAL,
                _ => EXIT_NOT_FOUND,
            })
        }
        Commands::Batch {
            stdin,
            policy,
            emails,
        } => {
            let policy = policy_from_str(policy)?;
            let candidates = collect_candidates(*stdin, emails)?;
            if candidates.is_empty() {
                bail!("no addresses given, pass them as arguments or use --stdin");
            }
            let outcome = match verifier {
                Ok(verifier) => {
                    BulkCoordinator::new(verifier, cli.batch_options())
                        .verify_batch(&candidates, policy)
                        .await
                }
                Err(err) => BatchOutcome {
                    results: candidates
                        .iter()
                        .map(|email| VerificationResult::internal_error(email.as_str(), err.to_string()))
                        .collect(),
                    chosen: None,
                },
            };
            write_batch(&outcome, format)?;
            Ok(if outcome.chosen.is_some() {
                EXIT_OK
            } else if outcome
                .results
                .iter()
                .all(|result| result.status == VerificationStatus::Error)
            {
                EXIT_FATAL
            } else {
                EXIT_NOT_FOUND
            })
        }
        Commands::Find {
            first,
            last,
            domain,
            policy,
        } => {
            let policy = policy_from_str(policy)?;
            let report = match verifier {
                Ok(verifier) => {
                    let coordinator = BulkCoordinator::new(verifier, cli.batch_options());
                    find_email_with(&coordinator, first, last, domain, policy).await
                }
                Err(err) => FinderReport::error(err.to_string(), Vec::new()),
            };
            write_finder(&report, format)?;
            Ok(match report.status {
                FinderStatus::Found => EXIT_OK,
                FinderStatus::Error => EXIT_FATAL,
                _ => EXIT_NOT_FOUND,
            })
        }
    }
}

fn collect_candidates(stdin: bool, args: &[String]) -> Result<Vec<String>> {
    let mut candidates: Vec<String> = args
        .iter()
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
        .collect();
    if stdin {
        for line in io::stdin().lock().lines() {
            let line = line.context("read stdin")?;
            let email = line.trim();
            if !email.is_empty() {
                candidates.push(email.to_string());
            }
        }
    }
    Ok(candidates)
}
