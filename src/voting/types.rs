//! Poll records, their JSON views, and voting errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the voting service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    /// Request shape rejected before touching the store.
    #[error("{0}")]
    Validation(String),

    /// No poll with this id.
    #[error("poll {0} not found")]
    PollNotFound(u64),

    /// Poll exists but no longer accepts votes.
    #[error("poll {0} is not active")]
    PollInactive(u64),

    /// Option id does not belong to the poll.
    #[error("option {option_id} does not belong to poll {poll_id}")]
    OptionNotFound { poll_id: u64, option_id: u64 },

    /// Persistence backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl VoteError {
    /// Stable error kind reported to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            VoteError::Validation(_) => "validation",
            VoteError::PollNotFound(_)
            | VoteError::PollInactive(_)
            | VoteError::OptionNotFound { .. } => "not_found",
            VoteError::Storage(_) => "storage",
        }
    }
}

/// Result type for voting operations.
pub type VoteResult<T> = Result<T, VoteError>;

/// A single choice within a poll, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: u64,
    pub option_text: String,
    pub vote_count: u32,
}

/// A poll as owned by the store. Totals and percentages are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: u64,
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<PollOption>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl Poll {
    /// Sum of all option counts.
    pub fn total_votes(&self) -> u32 {
        self.options.iter().map(|o| o.vote_count).sum()
    }

    /// Share of the total held by `option`, rounded to two decimals.
    pub fn percentage_of(&self, option: &PollOption) -> f64 {
        percentage(option.vote_count, self.total_votes())
    }
}

/// `count / total * 100` rounded half-up to two decimal places; 0.0 when
/// nobody has voted yet.
pub fn percentage(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = f64::from(count) / f64::from(total) * 100.0;
    (raw * 100.0 + 0.5).floor() / 100.0
}

/// Body of `POST /api/votes`.
///
/// Every field defaults so that missing keys reach validation instead of
/// failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePollRequest {
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<String>,
}

/// JSON view of an option, percentage derived on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub id: u64,
    pub option_text: String,
    pub vote_count: u32,
    pub percentage: f64,
}

/// JSON view of a poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollView {
    pub id: u64,
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<OptionView>,
    pub total_votes: u32,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl From<&Poll> for PollView {
    fn from(poll: &Poll) -> Self {
        let total = poll.total_votes();
        Self {
            id: poll.id,
            question: poll.question.clone(),
            description: poll.description.clone(),
            options: poll
                .options
                .iter()
                .map(|o| OptionView {
                    id: o.id,
                    option_text: o.option_text.clone(),
                    vote_count: o.vote_count,
                    percentage: percentage(o.vote_count, total),
                })
                .collect(),
            total_votes: total,
            created_at: poll.created_at,
            active: poll.active,
        }
    }
}
