use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use talent_pipeline::config::PipelineConfig;
use talent_pipeline::error::AppError;
use talent_pipeline::workflows::pipeline::{
    seed, AiInterviewStatus, AiInterviewSummary, CandidateId, CollectionRepository,
    CollectionStore, FileCollectionStore, InterviewLookup, MemoryCollectionStore,
    NotificationError, StageChangeEmail, StageChangeNotifier, StoreError,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store backend picked from configuration.
#[derive(Debug, Clone)]
pub(crate) enum ConfiguredStore {
    Memory(MemoryCollectionStore),
    File(FileCollectionStore),
}

impl ConfiguredStore {
    pub(crate) fn from_config(config: &PipelineConfig) -> Result<Self, StoreError> {
        match &config.store_dir {
            Some(dir) => Ok(Self::File(FileCollectionStore::open(dir)?)),
            None => Ok(Self::Memory(MemoryCollectionStore::new())),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Memory(_) => "in-memory".to_string(),
            Self::File(store) => format!("file store at {}", store.root().display()),
        }
    }
}

impl CollectionStore for ConfiguredStore {
    fn read(&self, collection: &str) -> Result<Option<String>, StoreError> {
        match self {
            Self::Memory(store) => store.read(collection),
            Self::File(store) => store.read(collection),
        }
    }

    fn write(&self, collection: &str, payload: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.write(collection, payload),
            Self::File(store) => store.write(collection, payload),
        }
    }
}

pub(crate) type AppRepository = CollectionRepository<ConfiguredStore>;

/// Open the configured store and load demo intake data when enabled.
pub(crate) fn build_repository(
    config: &PipelineConfig,
    today: NaiveDate,
) -> Result<Arc<AppRepository>, AppError> {
    let store = ConfiguredStore::from_config(config)?;
    let description = store.describe();
    let repository = Arc::new(CollectionRepository::new(store));
    if config.seed_demo_data {
        let added = repository.seed(seed::demo_candidates(today))?;
        info!(store = %description, added, "seeded demo candidates");
    } else {
        info!(store = %description, "candidate store opened");
    }
    Ok(repository)
}

/// Stand-in for the e-mail channel: logs each message and keeps a copy.
#[derive(Default, Clone)]
pub(crate) struct LoggingStageChangeNotifier {
    outbox: Arc<Mutex<Vec<StageChangeEmail>>>,
}

impl LoggingStageChangeNotifier {
    pub(crate) fn sent(&self) -> Vec<StageChangeEmail> {
        self.outbox.lock().expect("outbox mutex poisoned").clone()
    }
}

impl StageChangeNotifier for LoggingStageChangeNotifier {
    fn send_stage_change_email(&self, email: &StageChangeEmail) -> Result<(), NotificationError> {
        info!(
            to = %email.candidate_email,
            from_stage = %email.from_stage_name,
            to_stage = %email.to_stage_name,
            job = %email.job_title,
            "stage change e-mail queued"
        );
        self.outbox
            .lock()
            .map_err(|_| NotificationError::Transport("outbox poisoned".to_string()))?
            .push(email.clone());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryInterviewLookup {
    sessions: Arc<Mutex<HashMap<CandidateId, Vec<AiInterviewStatus>>>>,
}

impl InMemoryInterviewLookup {
    pub(crate) fn record(&self, candidate_id: CandidateId, status: AiInterviewStatus) {
        self.sessions
            .lock()
            .expect("interview mutex poisoned")
            .entry(candidate_id)
            .or_default()
            .push(status);
    }
}

impl InterviewLookup for InMemoryInterviewLookup {
    fn interviews_for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<AiInterviewSummary>, NotificationError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|_| NotificationError::Lookup("interview store poisoned".to_string()))?;
        Ok(guard
            .get(candidate_id)
            .map(|statuses| {
                statuses
                    .iter()
                    .map(|status| AiInterviewSummary { status: *status })
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
        .and_utc()
}
