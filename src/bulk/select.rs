use crate::verify::VerificationResult;

/// Pick a result once the whole batch is in.
///
/// On catch-all exchangers every candidate is accepted, but a real mailbox
/// often answers measurably slower than the rest. The first deliverable
/// candidate whose average probe latency exceeds `mean + sigma * stddev` of
/// the batch wins; otherwise the first deliverable one does.
pub fn choose_exhaustive(results: &[VerificationResult], sigma: f64) -> Option<usize> {
    timing_outlier(results, sigma).or_else(|| results.iter().position(|r| r.deliverable))
}

/// The baseline spans every result with a latency, bounced ones included.
/// Only deliverable results can be picked, so a slow bounce is never chosen.
pub fn timing_outlier(results: &[VerificationResult], sigma: f64) -> Option<usize> {
    let latencies: Vec<f64> = results
        .iter()
        .filter_map(VerificationResult::average_latency_ms)
        .collect();
    let (mean, stddev) = mean_and_stddev(&latencies)?;
    if stddev <= f64::EPSILON {
        return None;
    }
    let threshold = mean + sigma * stddev;
    tracing::debug!(mean, stddev, threshold, "timing outlier threshold");

    results.iter().position(|result| {
        result.deliverable
            && result
                .average_latency_ms()
                .is_some_and(|latency| latency > threshold)
    })
}

/// Population mean and standard deviation; `None` below two samples.
pub fn mean_and_stddev(samples: &[f64]) -> Option<(f64, f64)> {
    if samples.len() < 2 {
        return None;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}
