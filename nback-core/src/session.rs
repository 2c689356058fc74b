use serde::{Deserialize, Serialize};

/// One stimulus presentation as it happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    pub index: usize,
    pub stimulus: String,
    pub onset_ns: u64,
    /// The stimulus repeated the one shown two steps earlier.
    pub repeat: bool,
    /// The subject pressed the response key during this presentation.
    pub flagged: bool,
    /// The flag landed on an actual repeat and earned the point.
    pub scored: bool,
}

/// Everything recorded about a finished session, exported as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: u32,
    pub presentations: usize,
    pub repeat_opportunities: usize,
    pub duration_s: u64,
    pub log: Vec<Presentation>,
}
