use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::domain::{Candidate, CandidateFilter, CandidateId, Priority};
use super::notify::{InterviewLookup, StageChangeDispatcher, StageChangeNotifier, Toast};
use super::repository::CandidateRepository;
use super::service::{PipelineService, PipelineServiceError};
use super::stages::{Stage, StageId};

/// In-flight drag gesture. Lives between drag start and drop/cancel only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub active_candidate_id: CandidateId,
    pub source_stage_id: StageId,
    pub over_stage_id: Option<StageId>,
}

/// Card payload for a candidate tile and the drag preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub candidate_id: CandidateId,
    pub name: String,
    pub job_title: String,
    pub priority: Priority,
    pub priority_label: &'static str,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u8>,
    pub applied_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_interview_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub dragging: bool,
}

impl CardView {
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            candidate_id: candidate.id.clone(),
            name: candidate.name.clone(),
            job_title: candidate.job_title.clone(),
            priority: candidate.priority,
            priority_label: candidate.priority.label(),
            tags: candidate.tags.clone(),
            match_score: candidate.match_score,
            applied_date: candidate.applied_date,
            next_interview_date: candidate.next_interview_date,
            avatar: candidate.avatar.clone(),
            dragging: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    pub stage: Stage,
    pub cards: Vec<CardView>,
    /// Current drop target of an active drag.
    pub highlighted: bool,
}

impl BoardColumn {
    pub fn count(&self) -> usize {
        self.cards.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropOutcome {
    /// Dropped outside any column.
    Cancelled,
    /// Dropped back on the source column; the service is not called.
    SameStage,
    /// Candidate or target stage could not be resolved.
    NotFound,
    Moved {
        candidate: Candidate,
        #[serde(skip_serializing_if = "Option::is_none")]
        toast: Option<Toast>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("candidate {0} is already being dragged")]
    DragInProgress(CandidateId),
    #[error(transparent)]
    Service(#[from] PipelineServiceError),
}

/// Bridges drag gestures to the pipeline service and runs the notification
/// phase after each committed move. One drag at a time.
pub struct BoardController<R, N, L> {
    service: Arc<PipelineService<R>>,
    dispatcher: StageChangeDispatcher<N, L>,
    session: Option<DragSession>,
}

impl<R, N, L> BoardController<R, N, L>
where
    R: CandidateRepository + 'static,
    N: StageChangeNotifier + 'static,
    L: InterviewLookup + 'static,
{
    pub fn new(
        service: Arc<PipelineService<R>>,
        dispatcher: StageChangeDispatcher<N, L>,
    ) -> Self {
        Self {
            service,
            dispatcher,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Begin dragging a card. Unknown candidates start no session.
    pub fn drag_start(
        &mut self,
        candidate_id: &CandidateId,
    ) -> Result<Option<CardView>, BoardError> {
        if let Some(session) = &self.session {
            return Err(BoardError::DragInProgress(
                session.active_candidate_id.clone(),
            ));
        }

        let Some(candidate) = self.service.get_candidate(candidate_id)? else {
            debug!(%candidate_id, "drag started on unknown candidate");
            return Ok(None);
        };

        self.session = Some(DragSession {
            active_candidate_id: candidate.id.clone(),
            source_stage_id: candidate.stage_id.clone(),
            over_stage_id: None,
        });

        let mut preview = CardView::from_candidate(&candidate);
        preview.dragging = true;
        Ok(Some(preview))
    }

    /// Track the hovered column. Only active stages are valid drop targets.
    pub fn drag_over(&mut self, stage_id: Option<&StageId>) {
        let over = stage_id
            .and_then(|id| self.service.registry().active(id))
            .map(|stage| stage.id.clone());
        if let Some(session) = self.session.as_mut() {
            session.over_stage_id = over;
        }
    }

    pub fn cancel_drag(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(candidate_id = %session.active_candidate_id, "drag cancelled");
        }
    }

    /// Finish the gesture. The session is cleared whatever the outcome, and the
    /// source stage is re-read from the store since the card may have moved
    /// elsewhere during the drag.
    pub fn drag_end(
        &mut self,
        candidate_id: &CandidateId,
        target: Option<&StageId>,
    ) -> Result<DropOutcome, BoardError> {
        self.session = None;

        let Some(target) = target else {
            return Ok(DropOutcome::Cancelled);
        };

        let Some(current) = self.service.get_candidate(candidate_id)? else {
            return Ok(DropOutcome::NotFound);
        };
        if &current.stage_id == target {
            return Ok(DropOutcome::SameStage);
        }

        let Some(transition) = self.service.commit_transition(candidate_id, target)? else {
            return Ok(DropOutcome::NotFound);
        };
        if !transition.changed {
            return Ok(DropOutcome::SameStage);
        }

        let toast = self.dispatcher.dispatch(&transition);
        Ok(DropOutcome::Moved {
            candidate: transition.candidate,
            toast,
        })
    }

    /// Change a candidate's priority from its card. Toast only on a real change.
    pub fn set_priority(
        &mut self,
        candidate_id: &CandidateId,
        priority: Priority,
    ) -> Result<Option<Toast>, BoardError> {
        let Some(before) = self.service.get_candidate(candidate_id)? else {
            return Ok(None);
        };
        if before.priority == priority {
            return Ok(None);
        }

        let Some(updated) = self
            .service
            .update_candidate_priority(candidate_id, priority)?
        else {
            return Ok(None);
        };

        info!(candidate_id = %updated.id, priority = priority.label(), "priority changed from board");
        Ok(Some(Toast::success(
            "Priority updated",
            format!("{} is now {} priority", updated.name, priority.label()),
        )))
    }

    /// Column data for rendering, including drag highlight and card state.
    pub fn columns(&self, filter: &CandidateFilter) -> Result<Vec<BoardColumn>, BoardError> {
        let groups = self.service.group_by_stage(filter)?;
        let over = self
            .session
            .as_ref()
            .and_then(|session| session.over_stage_id.as_ref());
        let dragging = self
            .session
            .as_ref()
            .map(|session| &session.active_candidate_id);

        Ok(groups
            .into_iter()
            .map(|group| {
                let cards = group
                    .candidates
                    .iter()
                    .map(|candidate| {
                        let mut card = CardView::from_candidate(candidate);
                        card.dragging = dragging == Some(&candidate.id);
                        card
                    })
                    .collect();
                BoardColumn {
                    highlighted: over == Some(&group.stage.id),
                    stage: group.stage,
                    cards,
                }
            })
            .collect())
    }
}
