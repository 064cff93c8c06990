use crate::infra::{
    build_repository, end_of_day, AppRepository, InMemoryInterviewLookup,
    LoggingStageChangeNotifier,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use talent_pipeline::config::PipelineConfig;
use talent_pipeline::error::AppError;
use talent_pipeline::workflows::pipeline::{
    AiInterviewStatus, BoardColumn, BoardController, CandidateFilter, CandidateId, DropOutcome,
    ManualClock, PipelineAnalytics, PipelineService, PipelineSettings, Priority,
    StageChangeDispatcher, StageChangeEmail, StageId, StageRegistry, Toast,
};

#[derive(Args, Debug, Default)]
pub(crate) struct BoardDemoArgs {
    /// Date the demo roster is anchored to (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Refuse moves out of Hired and Rejected during the walkthrough.
    #[arg(long)]
    pub(crate) lock_terminal_stages: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct AnalyticsArgs {
    /// Report date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Read candidates from this store directory instead of the demo roster.
    #[arg(long)]
    pub(crate) store_dir: Option<PathBuf>,
}

type DemoBoard = BoardController<AppRepository, LoggingStageChangeNotifier, InMemoryInterviewLookup>;

/// One scripted gesture and what the board made of it.
#[derive(Debug)]
pub(crate) struct BoardStep {
    pub(crate) description: String,
    pub(crate) outcome: DropOutcome,
}

#[derive(Debug)]
pub(crate) struct BoardWalkthrough {
    pub(crate) steps: Vec<BoardStep>,
    pub(crate) priority_toast: Option<Toast>,
    pub(crate) columns: Vec<BoardColumn>,
    pub(crate) emails: Vec<StageChangeEmail>,
    pub(crate) analytics: PipelineAnalytics,
}

pub(crate) fn run_board_demo(args: BoardDemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let walkthrough = walk_board(today, args.lock_terminal_stages)?;
    render_walkthrough(today, &walkthrough);
    Ok(())
}

pub(crate) fn run_analytics_report(args: AnalyticsArgs) -> Result<(), AppError> {
    let AnalyticsArgs { as_of, store_dir } = args;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let config = PipelineConfig {
        seed_demo_data: store_dir.is_none(),
        store_dir,
        lock_terminal_stages: false,
    };

    let repository = build_repository(&config, as_of)?;
    let service = PipelineService::new(Arc::new(StageRegistry::standard()), repository);
    let analytics = service.analytics_at(end_of_day(as_of))?;
    render_analytics(&analytics);
    Ok(())
}

/// Replays a fixed drag-and-drop session over the demo roster.
pub(crate) fn walk_board(
    today: NaiveDate,
    lock_terminal_stages: bool,
) -> Result<BoardWalkthrough, AppError> {
    let config = PipelineConfig {
        store_dir: None,
        seed_demo_data: true,
        lock_terminal_stages,
    };
    let registry = Arc::new(StageRegistry::standard());
    let repository = build_repository(&config, today)?;
    let clock = Arc::new(ManualClock::new(end_of_day(today)));
    let service = Arc::new(
        PipelineService::new(registry.clone(), repository)
            .with_clock(clock)
            .with_settings(PipelineSettings {
                lock_terminal_stages,
            }),
    );

    let notifier = Arc::new(LoggingStageChangeNotifier::default());
    let interviews = Arc::new(InMemoryInterviewLookup::default());
    interviews.record(CandidateId::new("cand-003"), AiInterviewStatus::Scheduled);
    let dispatcher = StageChangeDispatcher::new(registry, notifier.clone(), interviews);
    let mut board = BoardController::new(service.clone(), dispatcher);

    let script: [(&str, &str, Option<&str>); 5] = [
        ("Advance to screening", "cand-001", Some("screening")),
        ("Invite to a phone screen", "cand-005", Some("phone-screen")),
        ("Book the technical round", "cand-003", Some("technical-interview")),
        ("Drop back on its own column", "cand-002", Some("screening")),
        ("Let go outside the board", "cand-004", None),
    ];

    let mut steps = Vec::with_capacity(script.len());
    for (description, candidate, target) in script {
        let outcome = drag(&mut board, candidate, target)?;
        steps.push(BoardStep {
            description: description.to_string(),
            outcome,
        });
    }

    let priority_toast = board.set_priority(&CandidateId::new("cand-005"), Priority::High)?;
    let columns = board.columns(&CandidateFilter::default())?;
    let analytics = service.get_pipeline_analytics()?;

    Ok(BoardWalkthrough {
        steps,
        priority_toast,
        columns,
        emails: notifier.sent(),
        analytics,
    })
}

fn drag(
    board: &mut DemoBoard,
    candidate: &str,
    target: Option<&str>,
) -> Result<DropOutcome, AppError> {
    let candidate_id = CandidateId::new(candidate);
    let target = target.map(StageId::new);
    board.drag_start(&candidate_id)?;
    board.drag_over(target.as_ref());
    Ok(board.drag_end(&candidate_id, target.as_ref())?)
}

fn render_walkthrough(today: NaiveDate, walkthrough: &BoardWalkthrough) {
    println!("Pipeline board walkthrough ({today})");

    println!("\nGestures");
    for step in &walkthrough.steps {
        match &step.outcome {
            DropOutcome::Moved { candidate, toast } => {
                println!(
                    "- {}: {} now in {}",
                    step.description, candidate.name, candidate.stage_id
                );
                if let Some(toast) = toast {
                    println!("    [{:?}] {}: {}", toast.kind, toast.title, toast.message);
                }
            }
            DropOutcome::SameStage => println!("- {}: same column, nothing saved", step.description),
            DropOutcome::Cancelled => println!("- {}: drag cancelled", step.description),
            DropOutcome::NotFound => println!("- {}: candidate or stage not found", step.description),
        }
    }

    if let Some(toast) = &walkthrough.priority_toast {
        println!("- {}: {}", toast.title, toast.message);
    }

    println!("\nBoard");
    for column in &walkthrough.columns {
        println!("{} ({})", column.stage.name, column.count());
        for card in &column.cards {
            let score = card
                .match_score
                .map(|score| format!(" | {score}% match"))
                .unwrap_or_default();
            println!(
                "  - {} | {} | {} priority{}",
                card.name, card.job_title, card.priority_label, score
            );
        }
    }

    if walkthrough.emails.is_empty() {
        println!("\nStage change e-mails: none sent");
    } else {
        println!("\nStage change e-mails");
        for email in &walkthrough.emails {
            println!(
                "- {} <{}>: {} -> {} ({})",
                email.candidate_name,
                email.candidate_email,
                email.from_stage_name,
                email.to_stage_name,
                email.job_title
            );
        }
    }

    println!();
    render_analytics(&walkthrough.analytics);
}

fn render_analytics(analytics: &PipelineAnalytics) {
    println!(
        "Pipeline analytics as of {} ({} candidates)",
        analytics.as_of.format("%Y-%m-%d %H:%M UTC"),
        analytics.total_candidates
    );
    for entry in &analytics.bottlenecks {
        let days = analytics
            .average_time_in_stage
            .get(&entry.stage_id)
            .copied()
            .unwrap_or_default();
        println!(
            "- {}: {} candidates | {:.1} days average in stage",
            entry.stage_name, entry.count, days
        );
    }
    if let Some(busiest) = analytics.busiest_stage() {
        println!("Busiest stage: {}", busiest.stage_name);
    }
}
