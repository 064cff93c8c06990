use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::stages::StageId;

/// Identifier wrapper for candidates on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Sort key, most urgent first.
    pub const fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Pipeline view of a candidate. Exactly one stage at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
    pub job_id: String,
    pub job_title: String,
    pub stage_id: StageId,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u8>,
    pub applied_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_interview_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Set by every committed transition; `None` until the first move.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_entered_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency counter, bumped on each stored write.
    #[serde(default)]
    pub version: u64,
}

impl Candidate {
    /// When the candidate entered the current stage, approximated by the
    /// application date for candidates that have never been moved.
    pub fn in_stage_since(&self) -> DateTime<Utc> {
        self.stage_entered_at
            .unwrap_or_else(|| self.applied_date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

/// Conjunctive candidate query. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFilter {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub search: Option<String>,
}

impl CandidateFilter {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        if let Some(job_id) = &self.job_id {
            if &candidate.job_id != job_id {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if candidate.priority != priority {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => candidate
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

/// Result of committing a stage move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTransition {
    pub candidate: Candidate,
    pub from_stage: StageId,
    pub to_stage: StageId,
    /// `false` when the candidate already sat in the target stage.
    pub changed: bool,
}

/// Append-only history entry written for every committed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransitionRecord {
    pub candidate_id: CandidateId,
    pub from_stage: StageId,
    pub to_stage: StageId,
    pub at: DateTime<Utc>,
}
