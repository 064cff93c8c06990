use chrono::{Duration, NaiveDate};

use super::domain::{Candidate, CandidateId, Priority};
use super::stages::StageId;

struct SeedRow {
    id: &'static str,
    name: &'static str,
    job_id: &'static str,
    job_title: &'static str,
    stage: &'static str,
    priority: Priority,
    tags: &'static [&'static str],
    match_score: Option<u8>,
    applied_days_ago: i64,
    interview_in_days: Option<i64>,
}

const ROWS: &[SeedRow] = &[
    SeedRow {
        id: "cand-001",
        name: "Amara Okafor",
        job_id: "job-backend",
        job_title: "Senior Backend Engineer",
        stage: "applied",
        priority: Priority::High,
        tags: &["rust", "distributed-systems"],
        match_score: Some(92),
        applied_days_ago: 2,
        interview_in_days: None,
    },
    SeedRow {
        id: "cand-002",
        name: "Lucas Fernandez",
        job_id: "job-backend",
        job_title: "Senior Backend Engineer",
        stage: "screening",
        priority: Priority::Medium,
        tags: &["go", "postgres"],
        match_score: Some(78),
        applied_days_ago: 9,
        interview_in_days: None,
    },
    SeedRow {
        id: "cand-003",
        name: "Mei Chen",
        job_id: "job-design",
        job_title: "Product Designer",
        stage: "phone-screen",
        priority: Priority::High,
        tags: &["figma", "design-systems"],
        match_score: Some(88),
        applied_days_ago: 14,
        interview_in_days: Some(1),
    },
    SeedRow {
        id: "cand-004",
        name: "Jonas Weber",
        job_id: "job-backend",
        job_title: "Senior Backend Engineer",
        stage: "technical-interview",
        priority: Priority::Low,
        tags: &["java", "kafka"],
        match_score: Some(65),
        applied_days_ago: 21,
        interview_in_days: Some(3),
    },
    SeedRow {
        id: "cand-005",
        name: "Priya Raman",
        job_id: "job-data",
        job_title: "Data Analyst",
        stage: "applied",
        priority: Priority::Medium,
        tags: &["sql", "dbt"],
        match_score: None,
        applied_days_ago: 1,
        interview_in_days: None,
    },
    SeedRow {
        id: "cand-006",
        name: "Samuel Osei",
        job_id: "job-design",
        job_title: "Product Designer",
        stage: "offer",
        priority: Priority::High,
        tags: &["ux-research"],
        match_score: Some(95),
        applied_days_ago: 35,
        interview_in_days: None,
    },
    SeedRow {
        id: "cand-007",
        name: "Elena Petrova",
        job_id: "job-data",
        job_title: "Data Analyst",
        stage: "rejected",
        priority: Priority::Low,
        tags: &["excel"],
        match_score: Some(41),
        applied_days_ago: 28,
        interview_in_days: None,
    },
];

/// Demo intake data with dates relative to `today`.
pub fn demo_candidates(today: NaiveDate) -> Vec<Candidate> {
    ROWS.iter()
        .map(|row| Candidate {
            id: CandidateId::new(row.id),
            name: row.name.to_string(),
            email: email_for(row.name),
            job_id: row.job_id.to_string(),
            job_title: row.job_title.to_string(),
            stage_id: StageId::new(row.stage),
            priority: row.priority,
            tags: row.tags.iter().map(|tag| tag.to_string()).collect(),
            match_score: row.match_score,
            applied_date: today - Duration::days(row.applied_days_ago),
            next_interview_date: row
                .interview_in_days
                .map(|days| today + Duration::days(days)),
            avatar: None,
            stage_entered_at: None,
            version: 0,
        })
        .collect()
}

fn email_for(name: &str) -> String {
    let local: String = name
        .split_whitespace()
        .map(|part| {
            part.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .collect::<Vec<_>>()
        .join(".");
    format!("{local}@candidates.example")
}
