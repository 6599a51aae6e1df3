//! Catch-all detection from a decoy / real / decoy probe sequence.
//!
//! Two signals are combined. Reply codes: an exchanger that accepts both
//! random decoys accepts anything. Message entropy: an exchanger that answers
//! every recipient with the same text while accepting the real address is
//! almost certainly not looking the mailbox up. Latency spread is reported
//! alongside but does not take part in the verdict.

use std::collections::HashSet;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::probe::{ProbeRecord, ProbeSequence};

const ACCEPTED: u16 = 250;

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerOptions {
    /// Messages are compared on their trailing characters only, so that
    /// per-recipient prefixes (queue ids, quoted addresses) drop out.
    pub message_window: usize,
    /// Latency spread under which the three probes count as "flat".
    pub flat_latency_ms: f64,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            message_window: 80,
            flat_latency_ms: 25.0,
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub entropy: usize,
    pub latency_delta_ms: f64,
    pub latency_flat: bool,
    /// `None` when the decoys do not settle it: a decoy check failed
    /// without a uniform-accept fingerprint, or the session aborted.
    pub is_catch_all: Option<bool>,
    pub real_code: Option<u16>,
    pub average_latency_ms: Option<f64>,
}

pub fn analyze(sequence: &ProbeSequence) -> Analysis {
    analyze_with(sequence, &AnalyzerOptions::default())
}

pub fn analyze_with(sequence: &ProbeSequence, options: &AnalyzerOptions) -> Analysis {
    let records = sequence.records();
    let entropy = message_entropy(&records, options.message_window);

    let latencies: Vec<f64> = records.iter().filter_map(|r| r.latency_ms).collect();
    let (latency_delta_ms, average_latency_ms) = latency_spread(&latencies);
    let latency_flat = latencies.len() > 1 && latency_delta_ms < options.flat_latency_ms;

    let (is_catch_all, real_code) = match sequence {
        ProbeSequence::Complete {
            decoy_before,
            real,
            decoy_after,
        } => {
            let decoys_accepted =
                decoy_before.code == Some(ACCEPTED) && decoy_after.code == Some(ACCEPTED);
            let uniform_accept = entropy == 1 && real.code == Some(ACCEPTED);
            let verdict = if decoys_accepted || uniform_accept {
                Some(true)
            } else if decoy_before.code.is_none() || decoy_after.code.is_none() {
                None
            } else {
                Some(false)
            };
            (verdict, real.code)
        }
        ProbeSequence::Aborted { .. } => (None, None),
    };

    let analysis = Analysis {
        entropy,
        latency_delta_ms,
        latency_flat,
        is_catch_all,
        real_code,
        average_latency_ms,
    };
    tracing::debug!(?analysis, "entropy analysis result");
    analysis
}

fn message_entropy(records: &[&ProbeRecord], window: usize) -> usize {
    records
        .iter()
        .map(|record| trailing_chars(&record.message, window))
        .collect::<HashSet<_>>()
        .len()
}

fn trailing_chars(message: &str, window: usize) -> &str {
    if window == 0 {
        return "";
    }
    match message.char_indices().rev().nth(window - 1) {
        Some((idx, _)) => &message[idx..],
        None => message,
    }
}

fn latency_spread(latencies: &[f64]) -> (f64, Option<f64>) {
    if latencies.is_empty() {
        return (0.0, None);
    }
    let max = latencies.iter().copied().fold(f64::MIN, f64::max);
    let min = latencies.iter().copied().fold(f64::MAX, f64::min);
    let mean = latencies.iter().sum::<f64>() / latencies.len() as f64;
    (max - min, Some(mean))
}
