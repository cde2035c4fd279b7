use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;

use super::domain::{
    Campaign, CampaignCandidate, CampaignError, CampaignId, CampaignLifecycle, CandidateId,
    CandidateProfile, MetricDelta, MetricKey,
};
use super::evaluation::{self, EvaluationEntry, EvaluationError};
use super::orchestrator::{self, TickError, TickOutcome};
use super::report::CampaignReport;
use super::repository::{
    CampaignRepository, CandidateCommit, MetricsSink, Notifier, RepositoryError, Scorer,
    ScorerError,
};
use super::status::{CandidateStatus, TransitionError};
use super::steps::CampaignStep;
use super::tasks::{derive_tasks, CandidateTask};

/// Service composing the repository and delivery collaborators with the campaign engine.
pub struct CampaignService<R, N, S, M> {
    repository: Arc<R>,
    notifier: Arc<N>,
    scorer: Arc<S>,
    metrics: Arc<M>,
    engine: EngineConfig,
}

static CAMPAIGN_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CANDIDATE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_campaign_id() -> CampaignId {
    let id = CAMPAIGN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CampaignId(format!("camp-{id:06}"))
}

fn next_candidate_id() -> CandidateId {
    let id = CANDIDATE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CandidateId(format!("cand-{id:06}"))
}

/// Payload accepted when creating a campaign.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CampaignDraft {
    pub name: String,
    pub steps: Vec<CampaignStep>,
}

/// Candidate signals that only move counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engagement {
    Opened,
    Responded,
}

/// Outcome of ticking every candidate of one campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignRunSummary {
    pub campaign_id: Option<CampaignId>,
    pub skipped: bool,
    pub advanced: usize,
    pub waiting: usize,
    pub failures: Vec<CandidateFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateFailure {
    pub candidate_id: CandidateId,
    pub error: String,
}

/// A computed candidate change waiting to be committed.
struct Staged<T> {
    output: T,
    candidate: Option<CampaignCandidate>,
    deltas: Vec<MetricDelta>,
}

impl<T> Staged<T> {
    fn unchanged(output: T) -> Self {
        Self {
            output,
            candidate: None,
            deltas: Vec::new(),
        }
    }

    fn changed(output: T, candidate: CampaignCandidate, deltas: Vec<MetricDelta>) -> Self {
        Self {
            output,
            candidate: Some(candidate),
            deltas,
        }
    }
}

impl<R, N, S, M> CampaignService<R, N, S, M>
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<N>,
        scorer: Arc<S>,
        metrics: Arc<M>,
        engine: EngineConfig,
    ) -> Self {
        Self {
            repository,
            notifier,
            scorer,
            metrics,
            engine,
        }
    }

    /// Validate and store a new draft campaign.
    pub fn create_campaign(&self, draft: CampaignDraft) -> Result<Campaign, CampaignServiceError> {
        let campaign = Campaign::new(next_campaign_id(), draft.name, draft.steps)?;
        let stored = self.repository.insert_campaign(campaign)?;
        info!(campaign_id = %stored.id.0, steps = stored.steps.len(), "campaign created");
        Ok(stored)
    }

    pub fn campaign(&self, campaign_id: &CampaignId) -> Result<Campaign, CampaignServiceError> {
        let campaign = self
            .repository
            .load_campaign(campaign_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(campaign)
    }

    /// Move a campaign through its lifecycle. The first activation stamps `activated_at`.
    pub fn set_lifecycle(
        &self,
        campaign_id: &CampaignId,
        lifecycle: CampaignLifecycle,
        now: DateTime<Utc>,
    ) -> Result<Campaign, CampaignServiceError> {
        let mut campaign = self.campaign(campaign_id)?;
        if !campaign.status.can_move_to(lifecycle) {
            return Err(CampaignError::InvalidLifecycle {
                from: campaign.status,
                to: lifecycle,
            }
            .into());
        }

        if lifecycle == CampaignLifecycle::Active && campaign.activated_at.is_none() {
            campaign.activated_at = Some(now);
        }
        campaign.status = lifecycle;
        self.repository
            .update_lifecycle(campaign_id, lifecycle, campaign.activated_at)?;

        info!(campaign_id = %campaign_id.0, status = lifecycle.label(), "campaign lifecycle changed");
        Ok(campaign)
    }

    pub fn attach_candidate(
        &self,
        campaign_id: &CampaignId,
        profile: CandidateProfile,
        now: DateTime<Utc>,
    ) -> Result<CampaignCandidate, CampaignServiceError> {
        let campaign = self.campaign(campaign_id)?;
        if campaign.status == CampaignLifecycle::Completed {
            return Err(CampaignServiceError::CampaignNotActive {
                status: campaign.status,
            });
        }

        let candidate = CampaignCandidate::attach(next_candidate_id(), profile, now);
        let stored = self.repository.insert_candidate(campaign_id, candidate)?;
        info!(
            campaign_id = %campaign_id.0,
            candidate_id = %stored.id.0,
            profile_id = %stored.profile.id.0,
            "candidate attached"
        );
        Ok(stored)
    }

    pub fn candidate(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
    ) -> Result<CampaignCandidate, CampaignServiceError> {
        let candidate = self
            .repository
            .load_candidate(campaign_id, candidate_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(candidate)
    }

    pub fn candidates(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<CampaignCandidate>, CampaignServiceError> {
        self.repository
            .candidate_ids(campaign_id)?
            .iter()
            .map(|candidate_id| self.candidate(campaign_id, candidate_id))
            .collect()
    }

    /// Advance one candidate by at most one step and commit the result.
    pub fn tick_candidate(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, CampaignServiceError> {
        let result = self.commit_with_retry(campaign_id, candidate_id, |campaign, candidate| {
            if !campaign.is_active() {
                return Err(CampaignServiceError::CampaignNotActive {
                    status: campaign.status,
                });
            }

            let outcome = orchestrator::tick(campaign, candidate, now, self.notifier.as_ref())?;
            if outcome.is_noop() {
                return Ok(Staged::unchanged(outcome));
            }

            let updated = outcome.candidate.clone();
            let deltas = outcome.metric_deltas();
            Ok(Staged::changed(outcome, updated, deltas))
        });

        match result {
            Ok((mut outcome, committed)) => {
                outcome.candidate = committed;
                if !outcome.is_noop() {
                    info!(
                        campaign_id = %campaign_id.0,
                        candidate_id = %candidate_id.0,
                        step = outcome.candidate.current_step,
                        status = outcome.candidate.status.label(),
                        effects = outcome.effects.len(),
                        "candidate ticked"
                    );
                }
                Ok(outcome)
            }
            Err(CampaignServiceError::Tick(TickError::Notifier(error))) => {
                warn!(
                    campaign_id = %campaign_id.0,
                    candidate_id = %candidate_id.0,
                    error = %error,
                    "delivery failed; step will be retried on the next tick"
                );
                Err(TickError::Notifier(error).into())
            }
            Err(error) => Err(error),
        }
    }

    /// Tick every candidate of an active campaign independently.
    pub fn run_campaign(
        &self,
        campaign_id: &CampaignId,
        now: DateTime<Utc>,
    ) -> Result<CampaignRunSummary, CampaignServiceError> {
        let campaign = self.campaign(campaign_id)?;
        let mut summary = CampaignRunSummary {
            campaign_id: Some(campaign_id.clone()),
            ..CampaignRunSummary::default()
        };

        if !campaign.is_active() {
            summary.skipped = true;
            return Ok(summary);
        }

        for candidate_id in self.repository.candidate_ids(campaign_id)? {
            match self.tick_candidate(campaign_id, &candidate_id, now) {
                Ok(outcome) if outcome.is_noop() => summary.waiting += 1,
                Ok(_) => summary.advanced += 1,
                Err(error) => summary.failures.push(CandidateFailure {
                    candidate_id,
                    error: error.to_string(),
                }),
            }
        }

        Ok(summary)
    }

    /// Run every active campaign; used by the background ticker.
    pub fn run_active_campaigns(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<CampaignRunSummary>, CampaignServiceError> {
        self.repository
            .active_campaigns()?
            .iter()
            .map(|campaign_id| self.run_campaign(campaign_id, now))
            .collect()
    }

    /// Recruiter-driven status change through the transition table.
    pub fn transition_status(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
        next: CandidateStatus,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<CampaignCandidate, CampaignServiceError> {
        let ((), candidate) =
            self.commit_with_retry(campaign_id, candidate_id, |_, candidate| {
                let transitioned = orchestrator::transition(candidate.clone(), next, note, now)?;
                Ok(Staged::changed(
                    (),
                    transitioned.candidate,
                    transitioned.deltas,
                ))
            })?;

        info!(
            campaign_id = %campaign_id.0,
            candidate_id = %candidate_id.0,
            status = next.label(),
            "candidate status changed"
        );
        Ok(candidate)
    }

    pub fn record_evaluation(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
        entry: EvaluationEntry,
    ) -> Result<CampaignCandidate, CampaignServiceError> {
        let ((), candidate) =
            self.commit_with_retry(campaign_id, candidate_id, |_, candidate| {
                let updated = evaluation::record_evaluation(candidate.clone(), entry.clone())?;
                Ok(Staged::changed((), updated, Vec::new()))
            })?;
        Ok(candidate)
    }

    /// Ask the scorer for an AI evaluation and fold it into the candidate.
    pub fn score_candidate(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
    ) -> Result<CampaignCandidate, CampaignServiceError> {
        let campaign = self.campaign(campaign_id)?;
        let candidate = self.candidate(campaign_id, candidate_id)?;

        let entry = self.scorer.score(&candidate.profile, &campaign)?;
        if entry.is_human() {
            return Err(ScorerError::InvalidResponse(
                "scorer returned a human evaluation".to_string(),
            )
            .into());
        }

        info!(
            campaign_id = %campaign_id.0,
            candidate_id = %candidate_id.0,
            score = entry.score,
            "candidate scored"
        );
        self.record_evaluation(campaign_id, candidate_id, entry)
    }

    /// Mark the form as received. The status is left to the transition table.
    pub fn submit_form(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<CampaignCandidate, CampaignServiceError> {
        let ((), candidate) =
            self.commit_with_retry(campaign_id, candidate_id, |_, candidate| {
                if candidate.form_submitted {
                    return Ok(Staged::unchanged(()));
                }
                let mut updated = candidate.clone();
                updated.form_submitted = true;
                updated.last_interaction = Some(now);
                Ok(Staged::changed(
                    (),
                    updated,
                    vec![MetricDelta::increment(MetricKey::Applied)],
                ))
            })?;
        Ok(candidate)
    }

    pub fn mark_cv_reviewed(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
        notes: &str,
    ) -> Result<CampaignCandidate, CampaignServiceError> {
        let ((), candidate) =
            self.commit_with_retry(campaign_id, candidate_id, |_, candidate| {
                if candidate.cv_reviewed && notes.trim().is_empty() {
                    return Ok(Staged::unchanged(()));
                }
                let mut updated = candidate.clone();
                updated.cv_reviewed = true;
                updated.append_review_note(notes);
                Ok(Staged::changed((), updated, Vec::new()))
            })?;
        Ok(candidate)
    }

    pub fn record_engagement(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
        engagement: Engagement,
        now: DateTime<Utc>,
    ) -> Result<CampaignCandidate, CampaignServiceError> {
        let ((), candidate) =
            self.commit_with_retry(campaign_id, candidate_id, |_, candidate| {
                let mut updated = candidate.clone();
                let metric = match engagement {
                    Engagement::Opened => MetricKey::Opened,
                    Engagement::Responded => {
                        updated.last_interaction = Some(now);
                        MetricKey::Responded
                    }
                };
                Ok(Staged::changed(
                    (),
                    updated,
                    vec![MetricDelta::increment(metric)],
                ))
            })?;
        Ok(candidate)
    }

    pub fn candidate_tasks(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
    ) -> Result<Vec<CandidateTask>, CampaignServiceError> {
        let candidate = self.candidate(campaign_id, candidate_id)?;
        Ok(derive_tasks(&candidate))
    }

    pub fn campaign_report(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<CampaignReport, CampaignServiceError> {
        let mut campaign = self.campaign(campaign_id)?;
        campaign.candidates = self.candidates(campaign_id)?;
        Ok(CampaignReport::build(&campaign))
    }

    /// Load, compute and commit against the loaded version, retrying the whole computation
    /// with fresh state after a version conflict.
    fn commit_with_retry<T, F>(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
        mut apply: F,
    ) -> Result<(T, CampaignCandidate), CampaignServiceError>
    where
        F: FnMut(&Campaign, &CampaignCandidate) -> Result<Staged<T>, CampaignServiceError>,
    {
        let mut attempt = 0;
        loop {
            let campaign = self.campaign(campaign_id)?;
            let current = self.candidate(campaign_id, candidate_id)?;

            let staged = apply(&campaign, &current)?;
            let Some(mut updated) = staged.candidate else {
                return Ok((staged.output, current));
            };

            let commit = CandidateCommit {
                campaign_id: campaign_id.clone(),
                candidate: updated.clone(),
                expected_version: current.version,
                metrics: staged.deltas.clone(),
            };

            match self.repository.commit_candidate(commit) {
                Ok(version) => {
                    updated.version = version;
                    for delta in staged.deltas {
                        self.metrics.record(campaign_id, delta);
                    }
                    return Ok((staged.output, updated));
                }
                Err(RepositoryError::VersionConflict { expected, found })
                    if attempt < self.engine.max_conflict_retries =>
                {
                    attempt += 1;
                    warn!(
                        campaign_id = %campaign_id.0,
                        candidate_id = %candidate_id.0,
                        expected,
                        found,
                        attempt,
                        "version conflict; retrying with fresh state"
                    );
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}

/// Error raised by the campaign service.
#[derive(Debug, thiserror::Error)]
pub enum CampaignServiceError {
    #[error(transparent)]
    Campaign(#[from] CampaignError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Tick(#[from] TickError),
    #[error(transparent)]
    Scorer(#[from] ScorerError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("campaign is {status}; only active campaigns are ticked")]
    CampaignNotActive { status: CampaignLifecycle },
}
