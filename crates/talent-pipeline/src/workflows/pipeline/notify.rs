use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{CandidateId, StageTransition};
use super::stages::StageRegistry;

/// Payload for the stage-change e-mail channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChangeEmail {
    pub candidate_name: String,
    pub candidate_email: String,
    pub from_stage_name: String,
    pub to_stage_name: String,
    pub job_title: String,
}

/// Outbound e-mail hook. Delivery is best effort.
pub trait StageChangeNotifier: Send + Sync {
    fn send_stage_change_email(&self, email: &StageChangeEmail) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiInterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl AiInterviewStatus {
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Scheduled | Self::InProgress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiInterviewSummary {
    pub status: AiInterviewStatus,
}

/// Lookup of AI interview sessions, consulted only to pick toast copy.
pub trait InterviewLookup: Send + Sync {
    fn interviews_for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<AiInterviewSummary>, NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("interview lookup failed: {0}")]
    Lookup(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Suggestion,
}

/// User-facing feedback produced after a committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub message: String,
}

impl Toast {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn suggestion(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Suggestion,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Second phase of a move: fan out side effects for an already committed
/// transition. Nothing here can fail the move.
pub struct StageChangeDispatcher<N, L> {
    stages: Arc<StageRegistry>,
    notifier: Arc<N>,
    interviews: Arc<L>,
}

impl<N, L> StageChangeDispatcher<N, L>
where
    N: StageChangeNotifier + 'static,
    L: InterviewLookup + 'static,
{
    pub fn new(stages: Arc<StageRegistry>, notifier: Arc<N>, interviews: Arc<L>) -> Self {
        Self {
            stages,
            notifier,
            interviews,
        }
    }

    /// Returns the toast to show, or `None` for unchanged transitions.
    pub fn dispatch(&self, transition: &StageTransition) -> Option<Toast> {
        if !transition.changed {
            debug!(candidate_id = %transition.candidate.id, "no stage change, skipping notifications");
            return None;
        }

        let candidate = &transition.candidate;
        let to_stage_name = self.stages.name_of(&transition.to_stage);

        let email = StageChangeEmail {
            candidate_name: candidate.name.clone(),
            candidate_email: candidate.email.clone(),
            from_stage_name: self.stages.name_of(&transition.from_stage),
            to_stage_name: to_stage_name.clone(),
            job_title: candidate.job_title.clone(),
        };
        if let Err(err) = self.notifier.send_stage_change_email(&email) {
            warn!(candidate_id = %candidate.id, error = %err, "stage change e-mail not delivered");
        }

        let interview_stage = self
            .stages
            .get(&transition.to_stage)
            .is_some_and(|stage| stage.is_interview());

        if interview_stage && !self.has_active_interview(&candidate.id) {
            return Some(Toast::suggestion(
                "Schedule an AI interview?",
                format!(
                    "{} moved to {}. No AI interview is set up yet; send one to speed up screening.",
                    candidate.name, to_stage_name
                ),
            ));
        }

        Some(Toast::success(
            "Candidate moved",
            format!("{} moved to {}", candidate.name, to_stage_name),
        ))
    }

    fn has_active_interview(&self, candidate_id: &CandidateId) -> bool {
        match self.interviews.interviews_for_candidate(candidate_id) {
            Ok(sessions) => sessions.iter().any(|session| session.status.is_active()),
            Err(err) => {
                warn!(%candidate_id, error = %err, "interview lookup failed, assuming none");
                false
            }
        }
    }
}
