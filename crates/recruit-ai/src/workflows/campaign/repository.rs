use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    Campaign, CampaignCandidate, CampaignId, CampaignLifecycle, CampaignMetrics, CandidateId,
    CandidateProfile, MetricDelta,
};
use super::evaluation::EvaluationEntry;
use super::steps::CampaignStep;

/// Atomic unit written at the end of a tick: the candidate plus the campaign counters it moved.
#[derive(Debug, Clone)]
pub struct CandidateCommit {
    pub campaign_id: CampaignId,
    pub candidate: CampaignCandidate,
    /// Version the candidate had when it was loaded.
    pub expected_version: u64,
    pub metrics: Vec<MetricDelta>,
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `load_campaign` returns the campaign without relying on its embedded candidate list;
/// candidates are loaded and committed one at a time under their own version.
pub trait CampaignRepository: Send + Sync {
    fn insert_campaign(&self, campaign: Campaign) -> Result<Campaign, RepositoryError>;
    fn load_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError>;
    fn update_lifecycle(
        &self,
        id: &CampaignId,
        lifecycle: CampaignLifecycle,
        activated_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;
    fn active_campaigns(&self) -> Result<Vec<CampaignId>, RepositoryError>;

    fn insert_candidate(
        &self,
        campaign_id: &CampaignId,
        candidate: CampaignCandidate,
    ) -> Result<CampaignCandidate, RepositoryError>;
    fn load_candidate(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
    ) -> Result<Option<CampaignCandidate>, RepositoryError>;
    /// Writes the candidate and applies the metric deltas when the stored version still equals
    /// `expected_version`. Returns the new version.
    fn commit_candidate(&self, commit: CandidateCommit) -> Result<u64, RepositoryError>;
    fn candidate_ids(&self, campaign_id: &CampaignId) -> Result<Vec<CandidateId>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("candidate was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound LinkedIn, email and calendar delivery.
pub trait Notifier: Send + Sync {
    fn deliver(
        &self,
        step: &CampaignStep,
        candidate: &CampaignCandidate,
    ) -> Result<(), NotifierError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifierError {
    #[error("delivery channel unavailable: {0}")]
    Transport(String),
    #[error("delivery refused: {0}")]
    Rejected(String),
}

/// AI evaluation of a profile against a campaign.
pub trait Scorer: Send + Sync {
    fn score(
        &self,
        profile: &CandidateProfile,
        campaign: &Campaign,
    ) -> Result<EvaluationEntry, ScorerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScorerError {
    #[error("scoring backend unavailable: {0}")]
    Unavailable(String),
    #[error("scoring backend returned an invalid evaluation: {0}")]
    InvalidResponse(String),
}

/// Receives every counter movement once it has been committed.
pub trait MetricsSink: Send + Sync {
    fn record(&self, campaign_id: &CampaignId, delta: MetricDelta);
}

/// Sanitized campaign summary for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignView {
    pub campaign_id: CampaignId,
    pub name: String,
    pub status: &'static str,
    pub steps: usize,
    pub candidates: usize,
    pub metrics: CampaignMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
}

impl CampaignView {
    pub fn new(campaign: &Campaign, candidates: usize) -> Self {
        Self {
            campaign_id: campaign.id.clone(),
            name: campaign.name.clone(),
            status: campaign.status.label(),
            steps: campaign.steps.len(),
            candidates,
            metrics: campaign.metrics,
            activated_at: campaign.activated_at,
        }
    }
}
