//! Concurrent evaluation of a candidate list.
//!
//! Each candidate is verified on its own tokio task holding one semaphore
//! permit, so at most `concurrency` SMTP sessions are open at once. Results
//! are consumed in completion order. Under
//! [`SelectionPolicy::FirstDeliverable`] the coordinator returns as soon as a
//! confident hit arrives; tasks already running finish (and close their
//! sessions) in the background and their results are dropped.

mod options;
mod select;
mod types;

pub use options::BatchOptions;
pub use select::{choose_exhaustive, mean_and_stddev, timing_outlier};
pub use types::{BatchOutcome, SelectionPolicy};

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::Semaphore;

use crate::candidates::generic_patterns;
use crate::verify::{VerificationResult, Verify};

pub struct BulkCoordinator<V> {
    verifier: Arc<V>,
    options: BatchOptions,
}

impl<V: Verify> BulkCoordinator<V> {
    pub fn new(verifier: V, options: BatchOptions) -> Self {
        Self::from_shared(Arc::new(verifier), options)
    }

    pub fn from_shared(verifier: Arc<V>, options: BatchOptions) -> Self {
        Self { verifier, options }
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Verify `candidates` and select a result according to `policy`.
    pub async fn verify_batch(
        &self,
        candidates: &[String],
        policy: SelectionPolicy,
    ) -> BatchOutcome {
        let concurrency = self.options.concurrency.max(1);
        let permits = Arc::new(Semaphore::new(concurrency));
        let chunk = self.options.effective_chunk(candidates.len());
        let mut collected: Vec<(usize, VerificationResult)> = Vec::with_capacity(candidates.len());

        tracing::debug!(
            candidates = candidates.len(),
            concurrency,
            chunk,
            %policy,
            "starting bulk verification"
        );

        for (chunk_no, group) in candidates.chunks(chunk).enumerate() {
            let mut pending: FuturesUnordered<_> = group
                .iter()
                .enumerate()
                .map(|(offset, candidate)| {
                    self.dispatch(chunk_no * chunk + offset, candidate, Arc::clone(&permits))
                })
                .collect();

            while let Some((index, result)) = pending.next().await {
                let winner =
                    policy == SelectionPolicy::FirstDeliverable && result.is_confident_hit();
                collected.push((index, result));
                if winner {
                    tracing::info!(
                        email = %candidates[index],
                        completed = collected.len(),
                        "early exit on confirmed address"
                    );
                    return BatchOutcome::from_indexed(collected, Some(index));
                }
            }
        }

        let mut outcome = BatchOutcome::from_indexed(collected, None);
        if policy == SelectionPolicy::Exhaustive {
            outcome.chosen = choose_exhaustive(&outcome.results, self.options.outlier_sigma)
                .map(|position| outcome.results[position].clone());
        }
        tracing::debug!(
            completed = outcome.results.len(),
            chosen = ?outcome.chosen_email(),
            "bulk verification completed"
        );
        outcome
    }

    /// Person candidates first; when none is chosen, the generic company
    /// addresses at `domain` under the same policy. Results of both stages
    /// are kept.
    pub async fn verify_with_fallback(
        &self,
        person: &[String],
        domain: &str,
        policy: SelectionPolicy,
    ) -> BatchOutcome {
        let mut outcome = self.verify_batch(person, policy).await;
        if outcome.chosen.is_some() {
            return outcome;
        }

        tracing::info!(domain, "no person pattern confirmed, trying generic addresses");
        let generic: Vec<String> = generic_patterns(domain)
            .into_iter()
            .filter(|candidate| !person.contains(candidate))
            .collect();
        let fallback = self.verify_batch(&generic, policy).await;
        outcome.results.extend(fallback.results);
        outcome.chosen = fallback.chosen;
        outcome
    }

    fn dispatch(
        &self,
        index: usize,
        candidate: &str,
        permits: Arc<Semaphore>,
    ) -> impl Future<Output = (usize, VerificationResult)> + Send + 'static {
        let verifier = Arc::clone(&self.verifier);
        let candidate = candidate.to_string();
        async move {
            let permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    return (index, VerificationResult::internal_error(candidate, err.to_string()));
                }
            };
            let email = candidate.clone();
            let task = tokio::spawn(async move {
                let _permit = permit;
                verifier.verify(&email).await
            });
            match task.await {
                Ok(result) => (index, result),
                Err(err) => {
                    tracing::error!(email = %candidate, "verification task failed: {err}");
                    let message = format!("verification task failed: {err}");
                    (index, VerificationResult::internal_error(candidate, message))
                }
            }
        }
    }
}
