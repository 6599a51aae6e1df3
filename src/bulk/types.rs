use std::fmt;

use crate::verify::VerificationResult;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Stop at the first deliverable, non catch-all result.
    #[default]
    FirstDeliverable,
    /// Probe everything, then prefer a timing outlier over the first
    /// deliverable result.
    Exhaustive,
}

impl SelectionPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "first" | "first-deliverable" | "early-exit" => Some(Self::FirstDeliverable),
            "exhaustive" | "batch" | "score" => Some(Self::Exhaustive),
            _ => None,
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FirstDeliverable => "first-deliverable",
            Self::Exhaustive => "exhaustive",
        })
    }
}

/// Everything a batch produced. `results` follows candidate order and only
/// holds the candidates that completed before the batch stopped.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchOutcome {
    pub results: Vec<VerificationResult>,
    pub chosen: Option<VerificationResult>,
}

impl BatchOutcome {
    pub(crate) fn from_indexed(
        mut indexed: Vec<(usize, VerificationResult)>,
        chosen_index: Option<usize>,
    ) -> Self {
        indexed.sort_by_key(|(index, _)| *index);
        let chosen = chosen_index.and_then(|wanted| {
            indexed
                .iter()
                .find(|(index, _)| *index == wanted)
                .map(|(_, result)| result.clone())
        });
        Self {
            results: indexed.into_iter().map(|(_, result)| result).collect(),
            chosen,
        }
    }

    pub fn chosen_email(&self) -> Option<&str> {
        self.chosen.as_ref().map(|result| result.email.as_str())
    }
}
