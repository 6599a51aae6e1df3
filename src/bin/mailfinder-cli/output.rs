use anyhow::{Result, bail};

use mailfinder_lib::{BatchOutcome, FinderReport, VerificationResult, VerificationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => bail!("unknown --format '{other}', use: human|json"),
        }
    }
}

pub fn write_verification(result: &VerificationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => println!("{}", human_verification(result)),
        OutputFormat::Json => write_json(result)?,
    }
    Ok(())
}

pub fn write_batch(outcome: &BatchOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for result in &outcome.results {
                println!("{}", human_verification(result));
            }
            match outcome.chosen_email() {
                Some(email) => println!("chosen: {email}"),
                None => println!("chosen: none"),
            }
        }
        OutputFormat::Json => write_json(outcome)?,
    }
    Ok(())
}

pub fn write_finder(report: &FinderReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for line in human_finder(report) {
                println!("{line}");
            }
        }
        OutputFormat::Json => write_json(report)?,
    }
    Ok(())
}

pub fn human_verification(result: &VerificationResult) -> String {
    let tag = match result.status {
        VerificationStatus::Deliverable if result.catch_all == Some(true) => {
            "[CATCH-ALL]"
        }
        VerificationStatus::Deliverable => "[OK]",
        VerificationStatus::Undeliverable => "[INVALID]",
        VerificationStatus::Unknown => "[UNKNOWN]",
        VerificationStatus::Error => "[ERROR]",
    };
    let mut line = format!(
        "{tag} {} :: {} (score {:.2})",
        result.email,
        result.reason(),
        result.score
    );
    if let Some(code) = result.smtp.code {
        line.push_str(&format!(" code={code}"));
    }
    if let Some(latency) = result.smtp.latency_ms {
        line.push_str(&format!(" latency={latency:.2}ms"));
    }
    if !result.mx_records.is_empty() {
        line.push_str(&format!(" mx={} ({})", result.mx_records[0], result.mx_provider));
    }
    line
}

pub fn human_finder(report: &FinderReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.debug.len() + 2);
    match &report.email {
        Some(email) => lines.push(format!(
            "{}: {email} :: {}",
            report.status,
            report.reason.as_deref().unwrap_or("")
        )),
        None => match &report.reason {
            Some(reason) => lines.push(format!("{}: {reason}", report.status)),
            None => lines.push(report.status.to_string()),
        },
    }
    for trace in &report.debug {
        let code = trace
            .code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "        {} code={code} deliverable={} {}",
            trace.email, trace.deliverable, trace.reason
        ));
    }
    lines
}

#[cfg(feature = "with-serde")]
fn write_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json<T>(_: &T) -> Result<()> {
    bail!("format=json requires the 'with-serde' feature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailfinder_lib::{CandidateTrace, FinderStatus, MxProvider, Reasoning};

    #[test]
    fn parses_formats() {
        assert_eq!(OutputFormat::parse("human").expect("human"), OutputFormat::Human);
        assert_eq!(OutputFormat::parse("json").expect("json"), OutputFormat::Json);
        assert!(OutputFormat::parse("csv").is_err());
    }

    #[test]
    fn human_line_for_catch_all() {
        let mut result = VerificationResult::new("jane@acme.io");
        result.status = VerificationStatus::Deliverable;
        result.deliverable = true;
        result.catch_all = Some(true);
        result.score = 0.85;
        result.reasoning = Reasoning::Accepted;
        result.smtp.code = Some(250);
        result.mx_records = vec!["aspmx.l.google.com".to_string()];
        result.mx_provider = MxProvider::Google;

        let line = human_verification(&result);
        assert_eq!(
            line,
            "[CATCH-ALL] jane@acme.io :: 250_ok (score 0.85) code=250 mx=aspmx.l.google.com (google)"
        );
    }

    #[test]
    fn human_line_for_bad_syntax() {
        let mut result = VerificationResult::new("jane");
        result.reasoning = Reasoning::BadSyntax;
        assert_eq!(
            human_verification(&result),
            "[INVALID] jane :: bad_syntax (score 0.00)"
        );
    }

    #[test]
    fn finder_lines_include_trail() {
        let report = FinderReport {
            status: FinderStatus::NotFound,
            valid: false,
            email: None,
            smtp_code: None,
            latency_ms: None,
            reason: None,
            mx_provider: None,
            debug: vec![CandidateTrace {
                email: "jane@acme.io".to_string(),
                code: Some(550),
                latency_ms: Some(12.5),
                deliverable: false,
                reason: "550_hard_fail".to_string(),
                mx_provider: MxProvider::Unknown,
            }],
        };
        let lines = human_finder(&report);
        assert_eq!(lines[0], "not_found");
        assert_eq!(
            lines[1],
            "        jane@acme.io code=550 deliverable=false 550_hard_fail"
        );
    }
}
