use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{Campaign, MetricDrift};
use super::repository::CampaignView;
use super::status::CandidateStatus;
use super::tasks::{derive_tasks, TaskKind};

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub status: CandidateStatus,
    pub status_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskCountEntry {
    pub task: TaskKind,
    pub task_label: &'static str,
    pub open: usize,
}

/// Pipeline snapshot for one campaign, including the counter checksum.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub campaign: CampaignView,
    pub status_counts: Vec<StatusCountEntry>,
    pub open_tasks: Vec<TaskCountEntry>,
    pub sequence_complete: usize,
    pub metric_drift: Vec<MetricDrift>,
}

impl CampaignReport {
    /// Expects `campaign.candidates` to hold every attached candidate.
    pub fn build(campaign: &Campaign) -> Self {
        let mut statuses: BTreeMap<CandidateStatus, usize> = BTreeMap::new();
        let mut tasks: BTreeMap<TaskKind, usize> = BTreeMap::new();
        let mut sequence_complete = 0;

        for candidate in &campaign.candidates {
            *statuses.entry(candidate.status).or_default() += 1;
            for task in derive_tasks(candidate) {
                *tasks.entry(task.kind).or_default() += 1;
            }
            if candidate.current_step >= campaign.steps.len() {
                sequence_complete += 1;
            }
        }

        let status_counts = CandidateStatus::ordered()
            .into_iter()
            .filter_map(|status| {
                statuses.get(&status).map(|count| StatusCountEntry {
                    status,
                    status_label: status.label(),
                    count: *count,
                })
            })
            .collect();

        let open_tasks = tasks
            .into_iter()
            .map(|(task, open)| TaskCountEntry {
                task,
                task_label: task.label(),
                open,
            })
            .collect();

        Self {
            campaign: CampaignView::new(campaign, campaign.candidates.len()),
            status_counts,
            open_tasks,
            sequence_complete,
            metric_drift: campaign.metric_drift(),
        }
    }

    pub fn count_for(&self, status: CandidateStatus) -> usize {
        self.status_counts
            .iter()
            .find(|entry| entry.status == status)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn is_consistent(&self) -> bool {
        self.metric_drift.is_empty()
    }
}
