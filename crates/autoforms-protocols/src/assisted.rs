//! Jobs and the AI-assisted execution path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::driver::Page;
use crate::types::{CookbookAction, UserData};

/// One unit of work: a task on a target URL with caller-supplied data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub job_type: String,
    pub target_url: String,
    #[serde(default)]
    pub user_data: Option<UserData>,
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        job_type: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            job_type: job_type.into(),
            target_url: target_url.into(),
            user_data: None,
        }
    }

    pub fn with_user_data(mut self, data: UserData) -> Self {
        self.user_data = Some(data);
        self
    }
}

/// Summary of an AI-assisted run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistedReport {
    pub success: bool,
    pub actions_executed: usize,
    pub actions_failed: usize,
    #[serde(default)]
    pub trace: Vec<CookbookAction>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The expensive fallback path taken when replay is unavailable or failed.
#[async_trait]
pub trait AssistedExecutor: Send + Sync {
    async fn run(&self, page: &dyn Page, job: &Job) -> AssistedReport;
}
