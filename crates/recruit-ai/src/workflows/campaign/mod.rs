//! Campaign workflow engine.
//!
//! Candidates move through a campaign's ordered steps one tick at a time. Each tick is a pure
//! transform of `(campaign, candidate, now)` into an updated candidate plus effects; the
//! service commits that result under an optimistic version check.

pub mod blueprint;
pub mod conditions;
pub mod domain;
pub mod evaluation;
pub mod orchestrator;
pub mod report;
pub mod repository;
pub mod router;
pub mod scheduler;
pub mod service;
pub mod status;
pub mod steps;
pub mod tasks;

#[cfg(test)]
mod tests;

pub use blueprint::CampaignBlueprint;
pub use domain::{
    Campaign, CampaignCandidate, CampaignError, CampaignId, CampaignLifecycle, CampaignMetrics,
    CandidateId, CandidateProfile, HistoryEntry, MetricDelta, MetricDrift, MetricKey, ProfileId,
};
pub use evaluation::{
    record_evaluation, weighted_score, CategoryScore, EvaluationEntry, EvaluationError,
    EvaluationOrigin, WeightedCriterion,
};
pub use orchestrator::{tick, transition, TickEffect, TickError, TickOutcome, Transitioned};
pub use report::CampaignReport;
pub use repository::{
    CampaignRepository, CampaignView, CandidateCommit, MetricsSink, Notifier, NotifierError,
    RepositoryError, Scorer, ScorerError,
};
pub use router::campaign_router;
pub use scheduler::{next_action, NextAction, WaitReason};
pub use service::{
    CampaignDraft, CampaignRunSummary, CampaignService, CampaignServiceError, CandidateFailure,
    Engagement,
};
pub use status::{allowed_next_statuses, validate, CandidateStatus, TransitionError};
pub use steps::{
    BranchAction, CampaignStep, ConditionOperator, ConditionalAction, ConnectConfig, EmailConfig,
    FormConfig, InterviewConfig, MessageConfig, ReviewConfig, StatusChangeConfig, StepCondition,
    StepId, StepKind, StepTarget, StepType, WaitForStatusConfig,
};
pub use tasks::{derive_tasks, CandidateTask, TaskKind, TaskPriority};
