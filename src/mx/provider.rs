use std::fmt;

/// Hosted mail platform inferred from the primary exchanger's hostname.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MxProvider {
    Microsoft365,
    Google,
    Proofpoint,
    Mimecast,
    Barracuda,
    #[default]
    Unknown,
}

impl MxProvider {
    pub fn detect(exchange: &str) -> Self {
        let host = exchange.to_ascii_lowercase();
        if host.contains("outlook") || host.contains("protection") {
            Self::Microsoft365
        } else if host.contains("google") || host.contains("aspmx") {
            Self::Google
        } else if host.contains("pphosted") {
            Self::Proofpoint
        } else if host.contains("mimecast") {
            Self::Mimecast
        } else if host.contains("barracuda") {
            Self::Barracuda
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Microsoft365 => "microsoft365",
            Self::Google => "google",
            Self::Proofpoint => "proofpoint",
            Self::Mimecast => "mimecast",
            Self::Barracuda => "barracuda",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MxProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
