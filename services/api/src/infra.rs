use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use recruit_ai::config::EngineConfig;
use recruit_ai::workflows::campaign::{
    Campaign, CampaignCandidate, CampaignId, CampaignLifecycle, CampaignRepository,
    CampaignService, CampaignStep, CandidateCommit, CandidateId, CandidateProfile, CategoryScore,
    EvaluationEntry, MetricDelta, MetricsSink, Notifier, NotifierError, RepositoryError, Scorer,
    ScorerError, StepKind,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Campaign service wired to the in-process adapters below.
pub(crate) type ApiService = CampaignService<
    InMemoryCampaignRepository,
    LoggingNotifier,
    HeuristicScorer,
    PrometheusMetricsSink,
>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_service(engine: EngineConfig) -> ApiService {
    CampaignService::new(
        Arc::new(InMemoryCampaignRepository::default()),
        Arc::new(LoggingNotifier),
        Arc::new(HeuristicScorer),
        Arc::new(PrometheusMetricsSink),
        engine,
    )
}

#[derive(Default)]
struct Store {
    campaigns: HashMap<CampaignId, Campaign>,
    candidates: HashMap<CampaignId, Vec<CampaignCandidate>>,
}

/// Versioned in-memory store; one lock covers a candidate commit and its counter updates.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCampaignRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryCampaignRepository {
    fn lock(&self) -> Result<MutexGuard<'_, Store>, RepositoryError> {
        self.store
            .lock()
            .map_err(|_| RepositoryError::Unavailable("campaign store lock poisoned".to_string()))
    }
}

impl CampaignRepository for InMemoryCampaignRepository {
    fn insert_campaign(&self, campaign: Campaign) -> Result<Campaign, RepositoryError> {
        let mut store = self.lock()?;
        if store.campaigns.contains_key(&campaign.id) {
            return Err(RepositoryError::Conflict);
        }
        store.campaigns.insert(campaign.id.clone(), campaign.clone());
        Ok(campaign)
    }

    fn load_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        Ok(self.lock()?.campaigns.get(id).cloned())
    }

    fn update_lifecycle(
        &self,
        id: &CampaignId,
        lifecycle: CampaignLifecycle,
        activated_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        let campaign = store
            .campaigns
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        campaign.status = lifecycle;
        campaign.activated_at = activated_at;
        Ok(())
    }

    fn active_campaigns(&self) -> Result<Vec<CampaignId>, RepositoryError> {
        let store = self.lock()?;
        let mut ids: Vec<CampaignId> = store
            .campaigns
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
        let mut store = self.lock()?;
        if !store.campaigns.contains_key(campaign_id) {
            return Err(RepositoryError::NotFound);
        }
        let roster = store.candidates.entry(campaign_id.clone()).or_default();
        if roster
            .iter()
            .any(|existing| existing.id == candidate.id || existing.profile.id == candidate.profile.id)
        {
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
        let store = self.lock()?;
        Ok(store
            .candidates
            .get(campaign_id)
            .and_then(|roster| roster.iter().find(|candidate| &candidate.id == candidate_id))
            .cloned())
    }

    fn commit_candidate(&self, commit: CandidateCommit) -> Result<u64, RepositoryError> {
        let mut store = self.lock()?;
        let Store {
            campaigns,
            candidates,
        } = &mut *store;

        let stored = candidates
            .get_mut(&commit.campaign_id)
            .and_then(|roster| {
                roster
                    .iter_mut()
                    .find(|candidate| candidate.id == commit.candidate.id)
            })
            .ok_or(RepositoryError::NotFound)?;

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

        if let Some(campaign) = campaigns.get_mut(&commit.campaign_id) {
            for delta in &commit.metrics {
                campaign.metrics.apply(delta);
            }
        }

        Ok(version)
    }

    fn candidate_ids(&self, campaign_id: &CampaignId) -> Result<Vec<CandidateId>, RepositoryError> {
        let store = self.lock()?;
        Ok(store
            .candidates
            .get(campaign_id)
            .map(|roster| roster.iter().map(|candidate| candidate.id.clone()).collect())
            .unwrap_or_default())
    }
}

/// Renders step templates and logs them instead of calling LinkedIn or SMTP.
#[derive(Default, Clone, Copy)]
pub(crate) struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn deliver(
        &self,
        step: &CampaignStep,
        candidate: &CampaignCandidate,
    ) -> Result<(), NotifierError> {
        let Some(template) = step_template(&step.kind) else {
            return Ok(());
        };
        let rendered = render_template(template, &candidate.profile);
        info!(
            candidate_id = %candidate.id.0,
            step = %step.id.0,
            step_type = %step.step_type(),
            message = %rendered,
            "outreach delivered"
        );
        Ok(())
    }
}

fn step_template(kind: &StepKind) -> Option<&str> {
    match kind {
        StepKind::LinkedinConnect(config) => config.note_template.as_deref(),
        StepKind::LinkedinMessage(config)
        | StepKind::LinkedinReminder(config)
        | StepKind::SendSelection(config)
        | StepKind::SendRejection(config) => Some(config.template.as_str()),
        StepKind::EmailMessage(config) => Some(config.template.as_str()),
        StepKind::FormSubmission(config) => Some(config.template.as_str()),
        StepKind::ScheduleInterview(config) => Some(config.template.as_str()),
        StepKind::ReviewRequired(_) | StepKind::StatusChange(_) | StepKind::WaitForStatus(_) => {
            None
        }
    }
}

/// Fills `{{first_name}}` and `{{full_name}}`; other placeholders are left for the channel.
pub(crate) fn render_template(template: &str, profile: &CandidateProfile) -> String {
    let first_name = profile
        .full_name
        .split_whitespace()
        .next()
        .unwrap_or(profile.full_name.as_str());
    template
        .replace("{{first_name}}", first_name)
        .replace("{{full_name}}", &profile.full_name)
}

/// Keyword scorer standing in for the hosted model.
#[derive(Default, Clone, Copy)]
pub(crate) struct HeuristicScorer;

impl HeuristicScorer {
    fn relevance(profile: &CandidateProfile, campaign: &Campaign) -> u16 {
        let Some(headline) = profile.headline.as_deref() else {
            return 20;
        };
        let headline = headline.to_ascii_lowercase();
        let keywords: Vec<String> = campaign
            .name
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| word.len() > 2)
            .map(str::to_ascii_lowercase)
            .collect();
        if keywords.is_empty() {
            return 50;
        }
        let hits = keywords
            .iter()
            .filter(|keyword| headline.contains(keyword.as_str()))
            .count();
        let ratio = hits * 60 / keywords.len();
        u16::try_from(40 + ratio).unwrap_or(100).min(100)
    }

    fn reachability(profile: &CandidateProfile) -> u16 {
        let channels = [profile.email.is_some(), profile.linkedin_url.is_some()]
            .into_iter()
            .filter(|present| *present)
            .count();
        match channels {
            2 => 100,
            1 => 70,
            _ => 30,
        }
    }
}

impl Scorer for HeuristicScorer {
    fn score(
        &self,
        profile: &CandidateProfile,
        campaign: &Campaign,
    ) -> Result<EvaluationEntry, ScorerError> {
        let relevance = Self::relevance(profile, campaign);
        let reachability = Self::reachability(profile);
        let overall = (relevance * 3 + reachability) / 4;

        let criteria = BTreeMap::from([
            (
                "relevance".to_string(),
                CategoryScore {
                    score: relevance,
                    feedback: format!("Headline overlap with '{}'", campaign.name),
                },
            ),
            (
                "reachability".to_string(),
                CategoryScore {
                    score: reachability,
                    feedback: "Contact channels on file".to_string(),
                },
            ),
        ]);

        EvaluationEntry::ai(overall, criteria, "Heuristic profile screen", Utc::now())
            .map_err(|err| ScorerError::InvalidResponse(err.to_string()))
    }
}

/// Forwards counter movements to the process-wide `metrics` recorder.
#[derive(Default, Clone, Copy)]
pub(crate) struct PrometheusMetricsSink;

impl MetricsSink for PrometheusMetricsSink {
    fn record(&self, campaign_id: &CampaignId, delta: MetricDelta) {
        let labels = [
            ("campaign", campaign_id.0.clone()),
            ("metric", delta.metric.label().to_string()),
        ];
        metrics::gauge!("recruit_campaign_metric", &labels).increment(delta.delta as f64);
        metrics::counter!("recruit_campaign_metric_events_total", &labels).increment(1);
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Start of the given day in UTC.
pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}
