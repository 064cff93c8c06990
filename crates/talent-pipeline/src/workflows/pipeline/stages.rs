use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Stable identifier for a pipeline column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(pub String);

impl StageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stage ids that close out a candidate's funnel by convention.
pub const TERMINAL_STAGE_IDS: [&str; 2] = ["hired", "rejected"];

/// Stage ids where an AI interview may be suggested on entry.
pub const INTERVIEW_STAGE_IDS: [&str; 3] =
    ["phone-screen", "technical-interview", "final-interview"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    pub color: String,
    pub order: u16,
    pub is_active: bool,
}

impl Stage {
    pub fn new(id: &str, name: &str, color: &str, order: u16) -> Self {
        Self {
            id: StageId::new(id),
            name: name.to_string(),
            color: color.to_string(),
            order,
            is_active: true,
        }
    }

    pub fn is_interview(&self) -> bool {
        INTERVIEW_STAGE_IDS.contains(&self.id.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StageRegistryError {
    #[error("stage id '{0}' is registered more than once")]
    DuplicateStage(StageId),
}

/// Ordered, effectively static set of stages for a tenant.
#[derive(Debug, Clone)]
pub struct StageRegistry {
    stages: Vec<Stage>,
}

impl StageRegistry {
    pub fn new(mut stages: Vec<Stage>) -> Result<Self, StageRegistryError> {
        let mut seen = HashSet::new();
        for stage in &stages {
            if !seen.insert(stage.id.clone()) {
                return Err(StageRegistryError::DuplicateStage(stage.id.clone()));
            }
        }
        stages.sort_by_key(|stage| stage.order);
        Ok(Self { stages })
    }

    pub fn standard() -> Self {
        Self {
            stages: standard_stages(),
        }
    }

    /// Active stages in column order.
    pub fn stages(&self) -> Vec<&Stage> {
        self.stages.iter().filter(|stage| stage.is_active).collect()
    }

    pub fn get(&self, id: &StageId) -> Option<&Stage> {
        self.stages.iter().find(|stage| &stage.id == id)
    }

    /// Resolve a stage only if it currently accepts candidates.
    pub fn active(&self, id: &StageId) -> Option<&Stage> {
        self.get(id).filter(|stage| stage.is_active)
    }

    pub fn is_terminal(&self, id: &StageId) -> bool {
        TERMINAL_STAGE_IDS.contains(&id.as_str())
    }

    /// Display name, falling back to the raw id for stages no longer registered.
    pub fn name_of(&self, id: &StageId) -> String {
        self.get(id)
            .map(|stage| stage.name.clone())
            .unwrap_or_else(|| id.0.clone())
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_stages() -> Vec<Stage> {
    vec![
        Stage::new("applied", "Applied", "#64748b", 0),
        Stage::new("screening", "Screening", "#0ea5e9", 1),
        Stage::new("phone-screen", "Phone Screen", "#6366f1", 2),
        Stage::new("technical-interview", "Technical Interview", "#8b5cf6", 3),
        Stage::new("final-interview", "Final Interview", "#d946ef", 4),
        Stage::new("offer", "Offer", "#f59e0b", 5),
        Stage::new("hired", "Hired", "#22c55e", 6),
        Stage::new("rejected", "Rejected", "#ef4444", 7),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_orders_stages_and_rejects_duplicates() {
        let registry = StageRegistry::new(vec![
            Stage::new("hired", "Hired", "#22c55e", 2),
            Stage::new("applied", "Applied", "#64748b", 0),
            Stage::new("phone-screen", "Phone Screen", "#6366f1", 1),
        ])
        .expect("unique ids");
        let ids: Vec<&str> = registry.stages().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["applied", "phone-screen", "hired"]);

        let duplicate = StageRegistry::new(vec![
            Stage::new("applied", "Applied", "#64748b", 0),
            Stage::new("applied", "Applied again", "#64748b", 1),
        ]);
        assert_eq!(
            duplicate.unwrap_err(),
            StageRegistryError::DuplicateStage(StageId::new("applied"))
        );
    }

    #[test]
    fn inactive_stages_are_hidden_but_resolvable() {
        let mut archived = Stage::new("sourcing", "Sourcing", "#94a3b8", 0);
        archived.is_active = false;
        let registry = StageRegistry::new(vec![
            archived,
            Stage::new("applied", "Applied", "#64748b", 1),
        ])
        .expect("unique ids");

        assert_eq!(registry.stages().len(), 1);
        assert!(registry.get(&StageId::new("sourcing")).is_some());
        assert!(registry.active(&StageId::new("sourcing")).is_none());
    }

    #[test]
    fn empty_registry_has_no_columns() {
        let registry = StageRegistry::new(Vec::new()).expect("empty is valid");
        assert!(registry.stages().is_empty());
        assert_eq!(registry.name_of(&StageId::new("ghost")), "ghost");
    }
}
