use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::Candidate;
use super::stages::{StageId, StageRegistry};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCount {
    pub stage_id: StageId,
    pub stage_name: String,
    pub count: usize,
}

/// Read-only aggregate recomputed from the candidate store on demand.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineAnalytics {
    pub total_candidates: usize,
    /// Active stages ranked by queued candidates, busiest first.
    pub bottlenecks: Vec<StageCount>,
    /// Mean days spent in the current stage, one decimal.
    pub average_time_in_stage: BTreeMap<StageId, f64>,
    pub as_of: DateTime<Utc>,
}

impl PipelineAnalytics {
    pub fn busiest_stage(&self) -> Option<&StageCount> {
        self.bottlenecks.first().filter(|entry| entry.count > 0)
    }
}

pub(crate) fn compute(
    registry: &StageRegistry,
    candidates: &[Candidate],
    as_of: DateTime<Utc>,
) -> PipelineAnalytics {
    let mut bottlenecks = Vec::new();
    let mut average_time_in_stage = BTreeMap::new();

    for stage in registry.stages() {
        let members: Vec<&Candidate> = candidates
            .iter()
            .filter(|candidate| candidate.stage_id == stage.id)
            .collect();

        let average = if members.is_empty() {
            0.0
        } else {
            let total: f64 = members
                .iter()
                .map(|candidate| days_between(candidate.in_stage_since(), as_of))
                .sum();
            round_tenths(total / members.len() as f64)
        };

        average_time_in_stage.insert(stage.id.clone(), average);
        bottlenecks.push(StageCount {
            stage_id: stage.id.clone(),
            stage_name: stage.name.clone(),
            count: members.len(),
        });
    }

    // Stable sort keeps column order for ties.
    bottlenecks.sort_by(|a, b| b.count.cmp(&a.count));

    PipelineAnalytics {
        total_candidates: candidates.len(),
        bottlenecks,
        average_time_in_stage,
        as_of,
    }
}

fn days_between(since: DateTime<Utc>, as_of: DateTime<Utc>) -> f64 {
    let seconds = (as_of - since).num_seconds().max(0);
    seconds as f64 / SECONDS_PER_DAY
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
