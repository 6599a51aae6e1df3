//! Person → address discovery on top of the bulk coordinator.

mod types;

pub use types::{CandidateTrace, FinderReport, FinderStatus};

use std::sync::LazyLock;

use regex::Regex;

use crate::bulk::{BulkCoordinator, SelectionPolicy};
use crate::candidates::person_patterns;
use crate::verify::{VerificationResult, VerificationStatus, Verify};

static DOMAIN_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("domain regex compiles")
});

/// Trimmed, lowercased `domain` when it looks like a mail domain.
pub fn normalize_finder_domain(domain: &str) -> Option<String> {
    let domain = domain.trim().to_ascii_lowercase();
    DOMAIN_SHAPE.is_match(&domain).then_some(domain)
}

/// Find the most likely address of `first last` at `domain`, probing the
/// whole candidate set before choosing.
pub async fn find_email<V: Verify>(
    coordinator: &BulkCoordinator<V>,
    first: &str,
    last: &str,
    domain: &str,
) -> FinderReport {
    find_email_with(coordinator, first, last, domain, SelectionPolicy::Exhaustive).await
}

pub async fn find_email_with<V: Verify>(
    coordinator: &BulkCoordinator<V>,
    first: &str,
    last: &str,
    domain: &str,
    policy: SelectionPolicy,
) -> FinderReport {
    let Some(domain) = normalize_finder_domain(domain) else {
        tracing::warn!(domain, "invalid domain");
        return FinderReport::invalid_domain();
    };

    let person = person_patterns(first, last, &domain);
    tracing::info!(
        candidates = person.len(),
        %domain,
        %policy,
        "generated patterns for {} {}",
        first.trim(),
        last.trim()
    );

    let outcome = coordinator
        .verify_with_fallback(&person, &domain, policy)
        .await;
    let trail: Vec<CandidateTrace> = outcome.results.iter().map(CandidateTrace::from).collect();

    match &outcome.chosen {
        Some(chosen) => {
            tracing::info!(email = %chosen.email, "found probable valid email");
            FinderReport::found(chosen, trail)
        }
        None if failed_everywhere(&outcome.results) => {
            let message = outcome
                .results
                .iter()
                .find_map(|result| result.detail.clone())
                .unwrap_or_else(|| "verification failed".to_string());
            tracing::error!(%domain, "every candidate failed: {message}");
            FinderReport::error(message, trail)
        }
        None => {
            tracing::warn!(%domain, probed = trail.len(), "no valid or likely candidate found");
            FinderReport::not_found(trail)
        }
    }
}

fn failed_everywhere(results: &[VerificationResult]) -> bool {
    !results.is_empty()
        && results
            .iter()
            .all(|result| result.status == VerificationStatus::Error)
}
