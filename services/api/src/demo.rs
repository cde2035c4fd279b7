use crate::infra::{build_service, parse_date, start_of_day, ApiService};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use clap::Args;
use recruit_ai::config::EngineConfig;
use recruit_ai::error::AppError;
use recruit_ai::workflows::campaign::{
    BranchAction, CampaignBlueprint, CampaignDraft, CampaignId, CampaignLifecycle, CampaignReport,
    CampaignServiceError, CampaignStep, CandidateId, CandidateProfile, CandidateStatus,
    ConditionalAction, Engagement, EvaluationEntry, ProfileId, StepCondition, StepTarget,
    WeightedCriterion,
};
use recruit_ai::workflows::roster::RosterImporter;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Optional roster CSV export (Profile ID, Name, Headline, Email, LinkedIn URL).
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Campaign activation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Number of simulated days to tick.
    #[arg(long, default_value_t = 21)]
    pub(crate) days: u32,
}

#[derive(Args, Debug, Default)]
pub(crate) struct BlueprintArgs {
    /// Print the steps as JSON instead of a summary.
    #[arg(long)]
    pub(crate) json: bool,
}

/// Scripted recruiter and candidate behavior applied to roster entries in rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persona {
    Strong,
    Weak,
    Silent,
    Withdrawing,
}

impl Persona {
    fn for_index(index: usize) -> Self {
        match index % 4 {
            0 => Self::Strong,
            1 => Self::Weak,
            2 => Self::Silent,
            _ => Self::Withdrawing,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Strong => "strong applicant",
            Self::Weak => "weak applicant",
            Self::Silent => "no response",
            Self::Withdrawing => "withdraws early",
        }
    }
}

const FORM_STEP_INDEX: usize = 4;

pub(crate) fn print_blueprint(args: BlueprintArgs) -> Result<(), AppError> {
    let steps = CampaignBlueprint::standard_outreach().into_steps();

    if args.json {
        match serde_json::to_string_pretty(&steps) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Blueprint JSON unavailable: {err}"),
        }
        return Ok(());
    }

    println!("Standard outreach blueprint");
    for step in &steps {
        println!("{}", describe_step(step));
        for condition in &step.conditions {
            println!("    requires {}", describe_condition(condition));
        }
        for action in &step.conditional_actions {
            println!("    {}", describe_action(action));
        }
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { roster, start, days } = args;

    let start = start_of_day(start.unwrap_or_else(|| Local::now().date_naive()));
    let profiles = match roster {
        Some(path) => RosterImporter::from_path(path)?,
        None => synthetic_roster(),
    };

    let service = build_service(EngineConfig::default());
    let campaign = service.create_campaign(CampaignDraft {
        name: "Senior Rust Engineer".to_string(),
        steps: CampaignBlueprint::standard_outreach().into_steps(),
    })?;
    service.set_lifecycle(&campaign.id, CampaignLifecycle::Active, start)?;

    println!("Campaign engine demo");
    println!(
        "Campaign {} '{}' activated {} with {} steps",
        campaign.id.0,
        campaign.name,
        start.format("%Y-%m-%d"),
        campaign.steps.len()
    );

    println!("\nRoster");
    let mut cast = Vec::new();
    for (index, profile) in profiles.into_iter().enumerate() {
        let persona = Persona::for_index(index);
        let name = profile.full_name.clone();
        let candidate = match service.attach_candidate(&campaign.id, profile, start) {
            Ok(candidate) => candidate,
            Err(err) => {
                println!("- {name}: not attached ({err})");
                continue;
            }
        };
        match service.score_candidate(&campaign.id, &candidate.id) {
            Ok(scored) => println!(
                "- {} ({}) -> {} | AI screen {}",
                name,
                persona.label(),
                candidate.id.0,
                scored.current_score.unwrap_or_default()
            ),
            Err(err) => println!("- {} ({}) -> {} | scoring unavailable: {}", name, persona.label(), candidate.id.0, err),
        }
        cast.push((candidate.id, persona));
    }

    println!("\nDaily ticks");
    for day in 0..=days {
        let now = start + Duration::days(i64::from(day));
        let summary = service.run_campaign(&campaign.id, now)?;
        if summary.advanced > 0 || !summary.failures.is_empty() {
            println!(
                "Day {:>2} ({}): {} advanced, {} waiting, {} failed",
                day,
                now.format("%Y-%m-%d"),
                summary.advanced,
                summary.waiting,
                summary.failures.len()
            );
        }
        for failure in &summary.failures {
            println!("  ! {}: {}", failure.candidate_id.0, failure.error);
        }

        for (candidate_id, persona) in &cast {
            match act(&service, &campaign.id, candidate_id, *persona, day, now) {
                Ok(Some(note)) => println!("  {}: {}", candidate_id.0, note),
                Ok(None) => {}
                Err(err) => println!("  {}: recruiter action failed ({})", candidate_id.0, err),
            }
        }
    }

    let report = service.campaign_report(&campaign.id)?;
    render_report(&service, &campaign.id, &report)?;
    Ok(())
}

/// One scripted interaction for the day, if the persona has anything to do.
fn act(
    service: &ApiService,
    campaign_id: &CampaignId,
    candidate_id: &CandidateId,
    persona: Persona,
    day: u32,
    now: DateTime<Utc>,
) -> Result<Option<String>, CampaignServiceError> {
    let candidate = service.candidate(campaign_id, candidate_id)?;
    let idle_days = candidate
        .last_interaction
        .map(|at| (now - at).num_days())
        .unwrap_or_default();
    let form_delivered = candidate.current_step >= FORM_STEP_INDEX;

    match persona {
        Persona::Strong | Persona::Weak if form_delivered && !candidate.form_submitted => {
            service.record_engagement(campaign_id, candidate_id, Engagement::Opened, now)?;
            service.record_engagement(campaign_id, candidate_id, Engagement::Responded, now)?;
            service.submit_form(campaign_id, candidate_id, now)?;
            service.mark_cv_reviewed(campaign_id, candidate_id, "CV reviewed during screening")?;

            let entry = if persona == Persona::Strong {
                EvaluationEntry::human(
                    Some("hiring-manager".to_string()),
                    vec![
                        WeightedCriterion::new("technical", 85, 50),
                        WeightedCriterion::new("communication", 80, 30),
                        WeightedCriterion::new("culture", 90, 20),
                    ],
                    "Clear ownership of production Rust services",
                    now,
                )?
            } else {
                EvaluationEntry::human_scored(
                    Some("hiring-manager".to_string()),
                    45,
                    "Limited production Rust experience",
                    now,
                )?
            };
            let updated = service.record_evaluation(campaign_id, candidate_id, entry)?;
            Ok(Some(format!(
                "form submitted and scored {}",
                updated.form_score.unwrap_or_default()
            )))
        }
        Persona::Strong
            if candidate.status == CandidateStatus::InterviewScheduled && idle_days >= 3 =>
        {
            service.transition_status(
                campaign_id,
                candidate_id,
                CandidateStatus::InterviewCompleted,
                "Panel interview held",
                now,
            )?;
            service.record_evaluation(
                campaign_id,
                candidate_id,
                EvaluationEntry::human_scored(
                    Some("panel".to_string()),
                    88,
                    "Excellent system design round",
                    now,
                )?,
            )?;
            Ok(Some("interview completed and evaluated".to_string()))
        }
        Persona::Strong
            if candidate.status == CandidateStatus::InterviewCompleted
                && candidate.interview_evaluated =>
        {
            service.transition_status(
                campaign_id,
                candidate_id,
                CandidateStatus::Selected,
                "Offer approved by the hiring manager",
                now,
            )?;
            Ok(Some("selected".to_string()))
        }
        Persona::Weak
            if candidate.status == CandidateStatus::UnderReview
                && candidate.form_evaluated
                && idle_days >= 1 =>
        {
            service.transition_status(
                campaign_id,
                candidate_id,
                CandidateStatus::Rejected,
                "Screening score below the interview bar",
                now,
            )?;
            Ok(Some("rejected after screening".to_string()))
        }
        Persona::Withdrawing if day >= 3 && !candidate.is_withdrawn() => {
            service.transition_status(
                campaign_id,
                candidate_id,
                CandidateStatus::Withdrawn,
                "Accepted another offer",
                now,
            )?;
            Ok(Some("withdrew".to_string()))
        }
        _ => Ok(None),
    }
}

fn render_report(
    service: &ApiService,
    campaign_id: &CampaignId,
    report: &CampaignReport,
) -> Result<(), AppError> {
    let view = &report.campaign;
    println!("\nCampaign report: {} ({})", view.name, view.status);
    println!(
        "- {} candidates | {} finished the sequence",
        view.candidates, report.sequence_complete
    );

    let metrics = view.metrics;
    println!(
        "- sent {} | opened {} | responded {} | applied {} | interviews {} | selected {} | rejected {}",
        metrics.sent,
        metrics.opened,
        metrics.responded,
        metrics.applied,
        metrics.interviews_scheduled,
        metrics.selected,
        metrics.rejected
    );

    println!("\nStatus breakdown");
    for entry in &report.status_counts {
        println!("- {}: {}", entry.status_label, entry.count);
    }

    if report.open_tasks.is_empty() {
        println!("\nOpen recruiter tasks: none");
    } else {
        println!("\nOpen recruiter tasks");
        for entry in &report.open_tasks {
            println!("- {}: {}", entry.task_label, entry.open);
        }
    }

    if report.is_consistent() {
        println!("\nCounter checksum: consistent");
    } else {
        println!("\nCounter checksum drift");
        for drift in &report.metric_drift {
            println!(
                "- {}: recorded {} vs expected {}",
                drift.metric.label(),
                drift.recorded,
                drift.expected
            );
        }
    }

    println!("\nCandidates");
    for candidate in service.candidates(campaign_id)? {
        let score = candidate
            .current_score
            .map(|score| score.to_string())
            .unwrap_or_else(|| "-".to_string());
        let latest = candidate
            .latest_history()
            .map(|entry| entry.note.as_str())
            .unwrap_or("no status changes");
        println!(
            "- {} {}: {} at step {}/{} | score {} | {}",
            candidate.id.0,
            candidate.profile.full_name,
            candidate.status,
            candidate.current_step,
            view.steps,
            score,
            latest
        );
    }

    Ok(())
}

fn describe_step(step: &CampaignStep) -> String {
    let delay = if step.delay_days == 0 {
        "immediately".to_string()
    } else {
        format!("after {} day(s)", step.delay_days)
    };
    format!(
        "{}. {} [{}] {}",
        step.order,
        step.id.0,
        step.step_type(),
        delay
    )
}

fn describe_condition(condition: &StepCondition) -> String {
    match condition {
        StepCondition::Status { operator, value } => format!("status {operator:?} {value}"),
        StepCondition::FormScore { operator, value } => format!("form score {operator:?} {value}"),
        StepCondition::TimeElapsed { operator, value } => {
            format!("days since last interaction {operator:?} {value}")
        }
    }
}

fn describe_action(action: &ConditionalAction) -> String {
    let guard = action
        .guard()
        .iter()
        .map(describe_condition)
        .collect::<Vec<_>>()
        .join(" and ");
    let effect = match &action.action {
        BranchAction::JumpTo(StepTarget::Order(order)) => format!("jump to step {order}"),
        BranchAction::JumpTo(StepTarget::Kind(kind)) => format!("jump to {kind}"),
        BranchAction::JumpTo(StepTarget::Complete) => "finish the sequence".to_string(),
        BranchAction::Run(kind) => format!("run {} instead", kind.step_type()),
    };
    format!("when {guard}: {effect}")
}

fn synthetic_roster() -> Vec<CandidateProfile> {
    [
        ("Ada Lovelace", "Senior Rust Engineer at Analytical Engines"),
        ("Grace Hopper", "Compiler engineer"),
        ("Linus Torvalds", "Kernel maintainer"),
        ("Barbara Liskov", "Distributed systems researcher"),
    ]
    .into_iter()
    .map(|(name, headline)| {
        let slug = name.to_ascii_lowercase().replace(' ', "-");
        CandidateProfile {
            id: ProfileId(format!("profile-{slug}")),
            full_name: name.to_string(),
            headline: Some(headline.to_string()),
            email: Some(format!("{slug}@example.com")),
            linkedin_url: Some(format!("https://linkedin.com/in/{slug}")),
        }
    })
    .collect()
}
