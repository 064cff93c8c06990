use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::analytics::{self, PipelineAnalytics};
use super::domain::{
    Candidate, CandidateFilter, CandidateId, Priority, StageTransition, StageTransitionRecord,
};
use super::repository::{CandidateRepository, RepositoryError};
use super::stages::{Stage, StageId, StageRegistry};

/// Time source for transition stamps and analytics.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to; used by demos and tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|guard| *guard).unwrap_or_else(|_| Utc::now())
    }
}

/// Policy switches for the transition operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineSettings {
    /// Refuse to move candidates out of `hired`/`rejected`.
    pub lock_terminal_stages: bool,
}

/// One board column's worth of candidates.
#[derive(Debug, Clone, Serialize)]
pub struct StageGroup {
    pub stage: Stage,
    pub candidates: Vec<Candidate>,
}

/// Service composing the stage registry and candidate repository.
pub struct PipelineService<R> {
    stages: Arc<StageRegistry>,
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    settings: PipelineSettings,
}

impl<R> PipelineService<R>
where
    R: CandidateRepository + 'static,
{
    pub fn new(stages: Arc<StageRegistry>, repository: Arc<R>) -> Self {
        Self {
            stages,
            repository,
            clock: Arc::new(SystemClock),
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.stages
    }

    /// Active stages in column order.
    pub fn stages(&self) -> Vec<&Stage> {
        self.stages.stages()
    }

    /// Candidates matching every supplied filter field.
    pub fn get_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<Candidate>, PipelineServiceError> {
        let candidates = self.repository.list()?;
        Ok(candidates
            .into_iter()
            .filter(|candidate| filter.matches(candidate))
            .collect())
    }

    pub fn get_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Option<Candidate>, PipelineServiceError> {
        Ok(self.repository.fetch(candidate_id)?)
    }

    /// Commit a stage move.
    ///
    /// `Ok(None)` means nothing happened: the candidate is unknown or the target
    /// stage is unknown or inactive. A move into the current stage returns the
    /// stored record untouched with `changed == false`.
    pub fn commit_transition(
        &self,
        candidate_id: &CandidateId,
        new_stage_id: &StageId,
    ) -> Result<Option<StageTransition>, PipelineServiceError> {
        let Some(target) = self.stages.active(new_stage_id) else {
            debug!(%candidate_id, stage_id = %new_stage_id, "transition target is not an active stage");
            return Ok(None);
        };

        let Some(candidate) = self.repository.fetch(candidate_id)? else {
            debug!(%candidate_id, "transition requested for unknown candidate");
            return Ok(None);
        };

        if candidate.stage_id == target.id {
            debug!(%candidate_id, stage_id = %target.id, "candidate already in target stage");
            return Ok(Some(StageTransition {
                from_stage: candidate.stage_id.clone(),
                to_stage: candidate.stage_id.clone(),
                candidate,
                changed: false,
            }));
        }

        if self.settings.lock_terminal_stages && self.stages.is_terminal(&candidate.stage_id) {
            return Err(PipelineServiceError::TerminalStage {
                candidate_id: candidate.id,
                stage_id: candidate.stage_id,
            });
        }

        let from_stage = candidate.stage_id.clone();
        let expected_version = candidate.version;
        let at = self.clock.now();

        let mut updated = candidate;
        updated.stage_id = target.id.clone();
        updated.stage_entered_at = Some(at);
        let stored = self.repository.replace(updated, expected_version)?;

        // The stage change is already committed; history is auxiliary.
        if let Err(err) = self.repository.append_transition(StageTransitionRecord {
            candidate_id: stored.id.clone(),
            from_stage: from_stage.clone(),
            to_stage: target.id.clone(),
            at,
        }) {
            warn!(candidate_id = %stored.id, error = %err, "failed to record stage history");
        }

        info!(
            candidate_id = %stored.id,
            from = %from_stage,
            to = %target.id,
            "candidate moved"
        );

        Ok(Some(StageTransition {
            candidate: stored,
            from_stage,
            to_stage: target.id.clone(),
            changed: true,
        }))
    }

    pub fn move_candidate_to_stage(
        &self,
        candidate_id: &CandidateId,
        new_stage_id: &StageId,
    ) -> Result<Option<Candidate>, PipelineServiceError> {
        Ok(self
            .commit_transition(candidate_id, new_stage_id)?
            .map(|transition| transition.candidate))
    }

    pub fn update_candidate_priority(
        &self,
        candidate_id: &CandidateId,
        priority: Priority,
    ) -> Result<Option<Candidate>, PipelineServiceError> {
        let Some(candidate) = self.repository.fetch(candidate_id)? else {
            return Ok(None);
        };
        if candidate.priority == priority {
            return Ok(Some(candidate));
        }

        let expected_version = candidate.version;
        let mut updated = candidate;
        updated.priority = priority;
        let stored = self.repository.replace(updated, expected_version)?;
        info!(candidate_id = %stored.id, priority = priority.label(), "priority updated");
        Ok(Some(stored))
    }

    pub fn stage_history(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<StageTransitionRecord>, PipelineServiceError> {
        Ok(self.repository.transitions(candidate_id)?)
    }

    /// Active stages paired with their candidates, highest priority first and
    /// longest-waiting first within a priority.
    pub fn group_by_stage(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<StageGroup>, PipelineServiceError> {
        let candidates = self.get_candidates(filter)?;
        Ok(self
            .stages
            .stages()
            .into_iter()
            .map(|stage| {
                let mut members: Vec<Candidate> = candidates
                    .iter()
                    .filter(|candidate| candidate.stage_id == stage.id)
                    .cloned()
                    .collect();
                members.sort_by(|a, b| {
                    a.priority
                        .rank()
                        .cmp(&b.priority.rank())
                        .then_with(|| a.in_stage_since().cmp(&b.in_stage_since()))
                });
                StageGroup {
                    stage: stage.clone(),
                    candidates: members,
                }
            })
            .collect())
    }

    pub fn get_pipeline_analytics(&self) -> Result<PipelineAnalytics, PipelineServiceError> {
        self.analytics_at(self.clock.now())
    }

    pub fn analytics_at(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<PipelineAnalytics, PipelineServiceError> {
        let candidates = self.repository.list()?;
        Ok(analytics::compute(&self.stages, &candidates, as_of))
    }
}

/// Error raised by the pipeline service. Unknown ids are not errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("candidate {candidate_id} is closed out in stage '{stage_id}'")]
    TerminalStage {
        candidate_id: CandidateId,
        stage_id: StageId,
    },
}
