use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod poller;
pub mod tracker;

pub const RECENT_JOBS_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub status: JobStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Read-only mirror of `GET /jobs`, in the order the server listed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobsSnapshot {
    entries: Vec<(String, Job)>,
}

impl JobsSnapshot {
    pub fn from_map(map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let entries = map
            .into_iter()
            .map(|(id, value)| Ok((id, serde_json::from_value::<Job>(value)?)))
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        Ok(Self { entries })
    }

    #[cfg(test)]
    pub fn from_entries(entries: Vec<(&str, Job)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(id, job)| (id.to_string(), job))
                .collect(),
        }
    }

    pub fn get(&self, job_id: &str) -> Option<&Job> {
        self.entries
            .iter()
            .find(|(id, _)| id == job_id)
            .map(|(_, job)| job)
    }

    /// Most recent first, capped at `limit`.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = (&str, &Job)> {
        self.entries
            .iter()
            .rev()
            .take(limit)
            .map(|(id, job)| (id.as_str(), job))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn short_id(job_id: &str) -> String {
    format!("{}...", job_id.chars().take(8).collect::<String>())
}

#[cfg(test)]
pub(crate) fn job(status: JobStatus) -> Job {
    Job {
        status,
        message: None,
        filepath: None,
        filename: None,
    }
}
