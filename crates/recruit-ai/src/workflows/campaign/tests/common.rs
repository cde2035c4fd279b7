use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::workflows::campaign::domain::{
    Campaign, CampaignCandidate, CampaignId, CampaignLifecycle, CandidateId, CandidateProfile,
    MetricDelta, ProfileId,
};
use crate::workflows::campaign::evaluation::{CategoryScore, EvaluationEntry};
use crate::workflows::campaign::repository::{
    CampaignRepository, CandidateCommit, MetricsSink, Notifier, NotifierError, RepositoryError,
    Scorer, ScorerError,
};
use crate::workflows::campaign::service::CampaignService;
use crate::workflows::campaign::steps::{
    CampaignStep, ConnectConfig, InterviewConfig, MessageConfig, StepId, StepKind,
    WaitForStatusConfig,
};
use crate::workflows::campaign::status::CandidateStatus;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn days(count: i64) -> Duration {
    Duration::days(count)
}

pub(super) fn profile(suffix: &str) -> CandidateProfile {
    CandidateProfile {
        id: ProfileId(format!("profile-{suffix}")),
        full_name: format!("Candidate {suffix}"),
        headline: Some("Senior Rust Engineer".to_string()),
        email: Some(format!("{suffix}@example.com")),
        linkedin_url: Some(format!("https://linkedin.com/in/{suffix}")),
    }
}

pub(super) fn candidate(suffix: &str) -> CampaignCandidate {
    CampaignCandidate::attach(
        CandidateId(format!("cand-{suffix}")),
        profile(suffix),
        now(),
    )
}

pub(super) fn message(template: &str) -> MessageConfig {
    MessageConfig {
        template: template.to_string(),
    }
}

pub(super) fn connect_step(order: u32) -> CampaignStep {
    CampaignStep::new(
        format!("connect-{order}"),
        order,
        StepKind::LinkedinConnect(ConnectConfig::default()),
    )
}

pub(super) fn message_step(order: u32) -> CampaignStep {
    CampaignStep::new(
        format!("message-{order}"),
        order,
        StepKind::LinkedinMessage(message("Hello {{first_name}}")),
    )
}

pub(super) fn interview_step(order: u32) -> CampaignStep {
    CampaignStep::new(
        format!("interview-{order}"),
        order,
        StepKind::ScheduleInterview(InterviewConfig {
            duration_minutes: 30,
            days_ahead: 3,
            calendar_id: None,
            template: "Pick a slot".to_string(),
        }),
    )
}

pub(super) fn wait_step(order: u32, target_status: CandidateStatus, timeout_days: u32) -> CampaignStep {
    CampaignStep::new(
        format!("wait-{order}"),
        order,
        StepKind::WaitForStatus(WaitForStatusConfig {
            target_status,
            timeout_days,
        }),
    )
}

/// Active campaign whose activation sits well before [`now`].
pub(super) fn active_campaign(steps: Vec<CampaignStep>) -> Campaign {
    let mut campaign =
        Campaign::new(CampaignId("camp-test".to_string()), "Platform hiring", steps)
            .expect("valid campaign");
    campaign.status = CampaignLifecycle::Active;
    campaign.activated_at = Some(now() - days(30));
    campaign
}

pub(super) type TestService =
    CampaignService<MemoryRepository, RecordingNotifier, StaticScorer, RecordingSink>;

pub(super) struct Harness {
    pub(super) service: TestService,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) sink: Arc<RecordingSink>,
}

pub(super) fn build_service() -> Harness {
    build_service_with(MemoryRepository::default(), RecordingNotifier::default(), EngineConfig::default())
}

pub(super) fn build_service_with(
    repository: MemoryRepository,
    notifier: RecordingNotifier,
    engine: EngineConfig,
) -> Harness {
    let repository = Arc::new(repository);
    let notifier = Arc::new(notifier);
    let sink = Arc::new(RecordingSink::default());
    let service = CampaignService::new(
        repository.clone(),
        notifier.clone(),
        Arc::new(StaticScorer::default()),
        sink.clone(),
        engine,
    );
    Harness {
        service,
        repository,
        notifier,
        sink,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    campaigns: Arc<Mutex<HashMap<CampaignId, Campaign>>>,
    candidates: Arc<Mutex<HashMap<CampaignId, Vec<CampaignCandidate>>>>,
    injected_conflicts: Arc<Mutex<u32>>,
}

impl MemoryRepository {
    /// The next `count` commits lose a race against a simulated concurrent writer.
    pub(super) fn with_conflicts(count: u32) -> Self {
        let repository = Self::default();
        *repository
            .injected_conflicts
            .lock()
            .expect("repository mutex poisoned") = count;
        repository
    }

    pub(super) fn stored_candidate(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
    ) -> Option<CampaignCandidate> {
        self.load_candidate(campaign_id, candidate_id)
            .expect("memory repository never fails")
    }

    pub(super) fn stored_campaign(&self, campaign_id: &CampaignId) -> Campaign {
        self.campaigns
            .lock()
            .expect("repository mutex poisoned")
            .get(campaign_id)
            .cloned()
            .expect("campaign stored")
    }
}

impl CampaignRepository for MemoryRepository {
    fn insert_campaign(&self, campaign: Campaign) -> Result<Campaign, RepositoryError> {
        let mut guard = self.campaigns.lock().expect("repository mutex poisoned");
        if guard.contains_key(&campaign.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(campaign.id.clone(), campaign.clone());
        Ok(campaign)
    }

    fn load_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        let guard = self.campaigns.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_lifecycle(
        &self,
        id: &CampaignId,
        lifecycle: CampaignLifecycle,
        activated_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.campaigns.lock().expect("repository mutex poisoned");
        let campaign = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        campaign.status = lifecycle;
        campaign.activated_at = activated_at;
        Ok(())
    }

    fn active_campaigns(&self) -> Result<Vec<CampaignId>, RepositoryError> {
        let guard = self.campaigns.lock().expect("repository mutex poisoned");
        let mut ids: Vec<CampaignId> = guard
            .values()
            .filter(|campaign| campaign.is_active())
            .map(|campaign| campaign.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn insert_candidate(
        &self,
        campaign_id: &CampaignId,
        candidate: CampaignCandidate,
    ) -> Result<CampaignCandidate, RepositoryError> {
        if !self
            .campaigns
            .lock()
            .expect("repository mutex poisoned")
            .contains_key(campaign_id)
        {
            return Err(RepositoryError::NotFound);
        }
        let mut guard = self.candidates.lock().expect("repository mutex poisoned");
        let roster = guard.entry(campaign_id.clone()).or_default();
        if roster.iter().any(|existing| existing.id == candidate.id) {
            return Err(RepositoryError::Conflict);
        }
        roster.push(candidate.clone());
        Ok(candidate)
    }

    fn load_candidate(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
    ) -> Result<Option<CampaignCandidate>, RepositoryError> {
        let guard = self.candidates.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(campaign_id)
            .and_then(|roster| roster.iter().find(|candidate| &candidate.id == candidate_id))
            .cloned())
    }

    fn commit_candidate(&self, commit: CandidateCommit) -> Result<u64, RepositoryError> {
        let mut candidates = self.candidates.lock().expect("repository mutex poisoned");
        let stored = candidates
            .get_mut(&commit.campaign_id)
            .and_then(|roster| {
                roster
                    .iter_mut()
                    .find(|candidate| candidate.id == commit.candidate.id)
            })
            .ok_or(RepositoryError::NotFound)?;

        let mut conflicts = self
            .injected_conflicts
            .lock()
            .expect("repository mutex poisoned");
        if *conflicts > 0 {
            *conflicts -= 1;
            stored.version += 1;
        }

        if stored.version != commit.expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: commit.expected_version,
                found: stored.version,
            });
        }

        let version = stored.version + 1;
        *stored = CampaignCandidate {
            version,
            ..commit.candidate
        };

        let mut campaigns = self.campaigns.lock().expect("repository mutex poisoned");
        if let Some(campaign) = campaigns.get_mut(&commit.campaign_id) {
            for delta in &commit.metrics {
                campaign.metrics.apply(delta);
            }
        }

        Ok(version)
    }

    fn candidate_ids(&self, campaign_id: &CampaignId) -> Result<Vec<CandidateId>, RepositoryError> {
        let guard = self.candidates.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(campaign_id)
            .map(|roster| roster.iter().map(|candidate| candidate.id.clone()).collect())
            .unwrap_or_default())
    }
}

pub(super) struct UnavailableRepository;

impl CampaignRepository for UnavailableRepository {
    fn insert_campaign(&self, _campaign: Campaign) -> Result<Campaign, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn load_campaign(&self, _id: &CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_lifecycle(
        &self,
        _id: &CampaignId,
        _lifecycle: CampaignLifecycle,
        _activated_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn active_campaigns(&self) -> Result<Vec<CampaignId>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_candidate(
        &self,
        _campaign_id: &CampaignId,
        _candidate: CampaignCandidate,
    ) -> Result<CampaignCandidate, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn load_candidate(
        &self,
        _campaign_id: &CampaignId,
        _candidate_id: &CandidateId,
    ) -> Result<Option<CampaignCandidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit_candidate(&self, _commit: CandidateCommit) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn candidate_ids(&self, _campaign_id: &CampaignId) -> Result<Vec<CandidateId>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingNotifier {
    deliveries: Arc<Mutex<Vec<(StepId, CandidateId)>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub(super) fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub(super) fn set_failing(&self, failing: bool) {
        *self.failing.lock().expect("notifier mutex poisoned") = failing;
    }

    pub(super) fn deliveries(&self) -> Vec<(StepId, CandidateId)> {
        self.deliveries
            .lock()
            .expect("notifier mutex poisoned")
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(
        &self,
        step: &CampaignStep,
        candidate: &CampaignCandidate,
    ) -> Result<(), NotifierError> {
        if *self.failing.lock().expect("notifier mutex poisoned") {
            return Err(NotifierError::Transport("linkedin rate limited".to_string()));
        }
        self.deliveries
            .lock()
            .expect("notifier mutex poisoned")
            .push((step.id.clone(), candidate.id.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct StaticScorer {
    pub(super) unavailable: bool,
}

impl Scorer for StaticScorer {
    fn score(
        &self,
        _profile: &CandidateProfile,
        _campaign: &Campaign,
    ) -> Result<EvaluationEntry, ScorerError> {
        if self.unavailable {
            return Err(ScorerError::Unavailable("model endpoint timed out".to_string()));
        }
        let criteria = BTreeMap::from([(
            "experience".to_string(),
            CategoryScore {
                score: 72,
                feedback: "Solid backend background".to_string(),
            },
        )]);
        EvaluationEntry::ai(72, criteria, "Good match", now())
            .map_err(|error| ScorerError::InvalidResponse(error.to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingSink {
    events: Mutex<Vec<(CampaignId, MetricDelta)>>,
}

impl RecordingSink {
    pub(super) fn events(&self) -> Vec<(CampaignId, MetricDelta)> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }
}

impl MetricsSink for RecordingSink {
    fn record(&self, campaign_id: &CampaignId, delta: MetricDelta) {
        self.events
            .lock()
            .expect("sink mutex poisoned")
            .push((campaign_id.clone(), delta));
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
