#![forbid(unsafe_code)]
//! mailfinder_lib: find and verify e-mail addresses by probing mail exchangers.
//!
//! The pipeline, leaf first: [`mx`] resolves exchangers, [`probe`] runs a
//! decoy / real / decoy SMTP sequence, [`analysis`] decides whether the
//! exchanger is catch-all, [`verify`] folds everything into one verdict,
//! [`bulk`] runs many verdicts concurrently and [`finder`] ties it to a name.

pub mod analysis;
pub mod bulk;
pub mod candidates;
pub mod finder;
pub mod mx;
pub mod probe;
pub mod verify;

pub use analysis::{Analysis, AnalyzerOptions, analyze, analyze_with};
pub use bulk::{BatchOptions, BatchOutcome, BulkCoordinator, SelectionPolicy};
pub use candidates::{generic_patterns, person_patterns};
pub use finder::{CandidateTrace, FinderReport, FinderStatus, find_email, find_email_with};
pub use mx::{MxError, MxProvider, MxRecord, resolve_exchangers};
pub use probe::{ProbeError, ProbeOptions, ProbeRecord, ProbeSequence, probe_mailbox};
pub use verify::{
    EmailType, Reasoning, SystemVerifier, VerificationResult, VerificationStatus, Verifier, Verify,
};
