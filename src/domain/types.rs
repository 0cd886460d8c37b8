use serde::{Deserialize, Serialize};

/// Ordinal likelihood that a post is machine-generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Likelihood {
    Low,
    Medium,
    High,
    Certain,
}

impl Likelihood {
    pub const ALL: [Likelihood; 4] = [
        Likelihood::Low,
        Likelihood::Medium,
        Likelihood::High,
        Likelihood::Certain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Likelihood::Low => "low",
            Likelihood::Medium => "medium",
            Likelihood::High => "high",
            Likelihood::Certain => "certain",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Likelihood::Low),
            "medium" => Some(Likelihood::Medium),
            "high" => Some(Likelihood::High),
            "certain" => Some(Likelihood::Certain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub likelihood: Likelihood,
    pub reason: String,
}

/// Processing state of a post. Absence from the state table means "unseen";
/// `Pending` is transient, everything else is terminal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostState {
    Pending,
    TooShort,
    NoText,
    Cached,
    Complete,
    Error,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueueSnapshot {
    pub depth: usize,
}

/// Persisted configuration, owned by the settings store and read once per
/// analysis.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            enabled: true,
        }
    }
}

/// Running tally of completed classifications.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub total: u64,
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub certain: u64,
}

impl Stats {
    pub fn count(&self, likelihood: Likelihood) -> u64 {
        match likelihood {
            Likelihood::Low => self.low,
            Likelihood::Medium => self.medium,
            Likelihood::High => self.high,
            Likelihood::Certain => self.certain,
        }
    }
}
