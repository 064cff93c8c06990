use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::pipeline::domain::{
    Candidate, CandidateId, Priority, StageTransitionRecord,
};
use crate::workflows::pipeline::notify::{
    AiInterviewStatus, AiInterviewSummary, InterviewLookup, NotificationError,
    StageChangeDispatcher, StageChangeEmail, StageChangeNotifier,
};
use crate::workflows::pipeline::repository::{
    CandidateRepository, CollectionRepository, RepositoryError,
};
use crate::workflows::pipeline::service::{ManualClock, PipelineService, PipelineSettings};
use crate::workflows::pipeline::stages::{Stage, StageId, StageRegistry};
use crate::workflows::pipeline::store::{MemoryCollectionStore, StoreError};
use crate::workflows::pipeline::BoardController;

pub(super) type MemoryRepository = CollectionRepository<MemoryCollectionStore>;

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn stage(id: &str) -> StageId {
    StageId::new(id)
}

pub(super) fn cid(id: &str) -> CandidateId {
    CandidateId::new(id)
}

/// Three-column board: applied -> phone-screen -> hired.
pub(super) fn scenario_registry() -> Arc<StageRegistry> {
    Arc::new(
        StageRegistry::new(vec![
            Stage::new("applied", "Applied", "#64748b", 0),
            Stage::new("phone-screen", "Phone Screen", "#6366f1", 1),
            Stage::new("hired", "Hired", "#22c55e", 2),
        ])
        .expect("unique stages"),
    )
}

pub(super) fn candidate(
    id: &str,
    name: &str,
    job_id: &str,
    stage_id: &str,
    priority: Priority,
) -> Candidate {
    Candidate {
        id: cid(id),
        name: name.to_string(),
        email: format!("{id}@candidates.example"),
        job_id: job_id.to_string(),
        job_title: format!("{job_id} role"),
        stage_id: stage(stage_id),
        priority,
        tags: vec!["referral".to_string()],
        match_score: Some(80),
        applied_date: NaiveDate::from_ymd_opt(2025, 9, 21).expect("valid date"),
        next_interview_date: None,
        avatar: None,
        stage_entered_at: None,
        version: 0,
    }
}

pub(super) fn roster() -> Vec<Candidate> {
    vec![
        candidate("c1", "Ada Lovelace", "job-eng", "applied", Priority::High),
        candidate("c2", "Grace Hopper", "job-eng", "applied", Priority::Medium),
        candidate("c3", "Alan Turing", "job-eng", "phone-screen", Priority::High),
        candidate("c4", "Katherine Johnson", "job-data", "applied", Priority::High),
        candidate("c5", "Edsger Dijkstra", "job-data", "hired", Priority::Low),
    ]
}

pub(super) struct Harness {
    pub(super) service: Arc<PipelineService<MemoryRepository>>,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) clock: Arc<ManualClock>,
}

pub(super) fn harness_with(
    registry: Arc<StageRegistry>,
    candidates: Vec<Candidate>,
    settings: PipelineSettings,
) -> Harness {
    let repository = Arc::new(CollectionRepository::new(MemoryCollectionStore::new()));
    repository.seed(candidates).expect("seed succeeds");
    let clock = Arc::new(ManualClock::new(start()));
    let service = Arc::new(
        PipelineService::new(registry, repository.clone())
            .with_clock(clock.clone())
            .with_settings(settings),
    );
    Harness {
        service,
        repository,
        clock,
    }
}

pub(super) fn harness() -> Harness {
    harness_with(scenario_registry(), roster(), PipelineSettings::default())
}

#[derive(Default, Clone)]
pub(super) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<StageChangeEmail>>>,
}

impl RecordingNotifier {
    pub(super) fn sent(&self) -> Vec<StageChangeEmail> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl StageChangeNotifier for RecordingNotifier {
    fn send_stage_change_email(&self, email: &StageChangeEmail) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl StageChangeNotifier for FailingNotifier {
    fn send_stage_change_email(&self, _email: &StageChangeEmail) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct StaticInterviews {
    pub(super) sessions: Vec<(CandidateId, AiInterviewStatus)>,
}

impl StaticInterviews {
    pub(super) fn with(candidate_id: &str, status: AiInterviewStatus) -> Self {
        Self {
            sessions: vec![(cid(candidate_id), status)],
        }
    }
}

impl InterviewLookup for StaticInterviews {
    fn interviews_for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<AiInterviewSummary>, NotificationError> {
        Ok(self
            .sessions
            .iter()
            .filter(|(id, _)| id == candidate_id)
            .map(|(_, status)| AiInterviewSummary { status: *status })
            .collect())
    }
}

pub(super) struct FailingInterviews;

impl InterviewLookup for FailingInterviews {
    fn interviews_for_candidate(
        &self,
        _candidate_id: &CandidateId,
    ) -> Result<Vec<AiInterviewSummary>, NotificationError> {
        Err(NotificationError::Lookup("interview api timed out".to_string()))
    }
}

pub(super) fn board_with<N, L>(
    harness: &Harness,
    notifier: Arc<N>,
    interviews: Arc<L>,
) -> BoardController<MemoryRepository, N, L>
where
    N: StageChangeNotifier + 'static,
    L: InterviewLookup + 'static,
{
    let dispatcher = StageChangeDispatcher::new(
        Arc::new(harness.service.registry().clone()),
        notifier,
        interviews,
    );
    BoardController::new(harness.service.clone(), dispatcher)
}

/// Snapshot used to prove a code path left the store untouched.
pub(super) fn snapshot(harness: &Harness) -> String {
    let candidates = harness.repository.list().expect("list succeeds");
    serde_json::to_string(&candidates).expect("serializable")
}

pub(super) struct UnavailableRepository;

impl CandidateRepository for UnavailableRepository {
    fn list(&self) -> Result<Vec<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable(StoreError::Poisoned))
    }

    fn fetch(&self, _id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable(StoreError::Poisoned))
    }

    fn insert(&self, _candidate: Candidate) -> Result<Candidate, RepositoryError> {
        Err(RepositoryError::Unavailable(StoreError::Poisoned))
    }

    fn replace(
        &self,
        _candidate: Candidate,
        _expected_version: u64,
    ) -> Result<Candidate, RepositoryError> {
        Err(RepositoryError::Unavailable(StoreError::Poisoned))
    }

    fn append_transition(&self, _record: StageTransitionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable(StoreError::Poisoned))
    }

    fn transitions(
        &self,
        _id: &CandidateId,
    ) -> Result<Vec<StageTransitionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable(StoreError::Poisoned))
    }
}

/// Simulates another session writing between our read and our write.
pub(super) struct RacingRepository {
    pub(super) inner: MemoryRepository,
}

impl RacingRepository {
    pub(super) fn seeded(candidates: Vec<Candidate>) -> Self {
        let inner = CollectionRepository::new(MemoryCollectionStore::new());
        inner.seed(candidates).expect("seed succeeds");
        Self { inner }
    }
}

impl CandidateRepository for RacingRepository {
    fn list(&self) -> Result<Vec<Candidate>, RepositoryError> {
        self.inner.list()
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn insert(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        self.inner.insert(candidate)
    }

    fn replace(
        &self,
        candidate: Candidate,
        expected_version: u64,
    ) -> Result<Candidate, RepositoryError> {
        if let Some(current) = self.inner.fetch(&candidate.id)? {
            let mut competing = current.clone();
            competing.tags.push("touched-elsewhere".to_string());
            self.inner.replace(competing, current.version)?;
        }
        self.inner.replace(candidate, expected_version)
    }

    fn append_transition(&self, record: StageTransitionRecord) -> Result<(), RepositoryError> {
        self.inner.append_transition(record)
    }

    fn transitions(
        &self,
        id: &CandidateId,
    ) -> Result<Vec<StageTransitionRecord>, RepositoryError> {
        self.inner.transitions(id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
