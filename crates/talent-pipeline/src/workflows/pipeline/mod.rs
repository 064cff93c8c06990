//! Candidate pipeline: stage registry, candidate store, transition service,
//! analytics, and the board controller that drives moves from drag gestures.
//!
//! A move is two phases. [`PipelineService::commit_transition`] validates and
//! persists the stage change; [`StageChangeDispatcher::dispatch`] then runs
//! the best-effort side effects. Only the first phase can fail a move.

pub mod analytics;
pub mod board;
pub mod domain;
pub mod notify;
pub mod repository;
pub mod router;
pub mod seed;
pub mod service;
pub mod stages;
pub mod store;

#[cfg(test)]
mod tests;

pub use analytics::{PipelineAnalytics, StageCount};
pub use board::{BoardColumn, BoardController, BoardError, CardView, DragSession, DropOutcome};
pub use domain::{
    Candidate, CandidateFilter, CandidateId, Priority, StageTransition, StageTransitionRecord,
};
pub use notify::{
    AiInterviewStatus, AiInterviewSummary, InterviewLookup, NotificationError, StageChangeDispatcher,
    StageChangeEmail, StageChangeNotifier, Toast, ToastKind,
};
pub use repository::{CandidateRepository, CollectionRepository, RepositoryError};
pub use router::pipeline_router;
pub use service::{
    Clock, ManualClock, PipelineService, PipelineServiceError, PipelineSettings, StageGroup,
    SystemClock,
};
pub use stages::{Stage, StageId, StageRegistry, StageRegistryError};
pub use store::{CollectionStore, FileCollectionStore, MemoryCollectionStore, StoreError};
