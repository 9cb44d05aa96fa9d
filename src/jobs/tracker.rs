use crate::jobs::{JobStatus, JobsSnapshot};

pub const UNKNOWN_FAILURE: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub job_id: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobNotice {
    Completed {
        job_id: String,
        download: Option<DownloadLink>,
    },
    Failed {
        job_id: String,
        message: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Latest status of the tracked job, if the snapshot lists it.
    pub status: Option<JobStatus>,
    pub notice: Option<JobNotice>,
}

/// Follows the most recently submitted job and announces its terminal status once.
#[derive(Debug, Clone, Default)]
pub struct JobTracker {
    last_job_id: Option<String>,
    announced: bool,
}

impl JobTracker {
    pub fn track(&mut self, job_id: impl Into<String>) {
        self.last_job_id = Some(job_id.into());
        self.announced = false;
    }

    pub fn last_job_id(&self) -> Option<&str> {
        self.last_job_id.as_deref()
    }

    #[cfg(test)]
    pub fn is_announced(&self) -> bool {
        self.announced
    }

    pub fn reconcile(&mut self, snapshot: &JobsSnapshot) -> Reconciliation {
        let Some(job_id) = self.last_job_id.as_deref() else {
            return Reconciliation::default();
        };
        let Some(job) = snapshot.get(job_id) else {
            return Reconciliation::default();
        };

        let mut outcome = Reconciliation {
            status: Some(job.status),
            notice: None,
        };
        if self.announced || !job.status.is_terminal() {
            return outcome;
        }

        outcome.notice = Some(match job.status {
            JobStatus::Done => JobNotice::Completed {
                job_id: job_id.to_string(),
                download: job.filepath.as_ref().map(|_| DownloadLink {
                    job_id: job_id.to_string(),
                    filename: job
                        .filename
                        .clone()
                        .unwrap_or_else(|| "document".to_string()),
                }),
            },
            _ => JobNotice::Failed {
                job_id: job_id.to_string(),
                message: job
                    .message
                    .clone()
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| UNKNOWN_FAILURE.to_string()),
            },
        });
        self.announced = true;
        tracing::info!(job_id, status = job.status.as_str(), "job reached terminal state");
        outcome
    }
}
