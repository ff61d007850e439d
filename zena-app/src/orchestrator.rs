use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use zena_tasks::{Job, JobError, JobManager};
use zena_tools::{AliasResolver, ExecutionContext, ToolError, ToolInvoker};

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Job(#[from] JobError),
}

/// Front door for agent requests: resolve a name, then run it either as a
/// tracked job or inline.
pub struct Orchestrator {
    resolver: Arc<AliasResolver>,
    invoker: Arc<ToolInvoker>,
    jobs: JobManager,
}

impl Orchestrator {
    pub fn new(resolver: Arc<AliasResolver>, invoker: Arc<ToolInvoker>, jobs: JobManager) -> Self {
        Self {
            resolver,
            invoker,
            jobs,
        }
    }

    pub fn resolver(&self) -> &Arc<AliasResolver> {
        &self.resolver
    }

    pub fn jobs(&self) -> &JobManager {
        &self.jobs
    }

    pub fn resolve(&self, candidate: &str) -> Result<String, ToolError> {
        self.resolver
            .resolve(candidate)
            .ok_or_else(|| ToolError::CapabilityNotFound(candidate.to_string()))
    }

    /// Resolve `candidate` and run it in the background as a job owned by
    /// `ctx.user_id`. Returns the job as soon as it is running; its outcome
    /// arrives through job events.
    pub async fn submit(
        &self,
        ctx: ExecutionContext,
        candidate: &str,
        params: Value,
    ) -> Result<Job, OrchestratorError> {
        let tool_name = self.resolve(candidate)?;
        if tool_name != candidate {
            debug!("Resolved '{}' to {}", candidate, tool_name);
        }

        let invoker = self.invoker.clone();
        let user_id = ctx.user_id.clone();
        let job = self
            .jobs
            .spawn_job(tool_name, user_id, move |job| async move {
                let ctx = ctx.with_job(job.id.clone());
                invoker
                    .invoke(ctx, &job.tool_name, params)
                    .await
                    .map_err(|e| failure_message(&e))
            })
            .await?;

        info!("Submitted job {} ({}) for {}", job.id, job.tool_name, job.user_id);
        Ok(job)
    }

    /// Resolve and execute synchronously without creating a job.
    pub async fn invoke_now(
        &self,
        ctx: ExecutionContext,
        candidate: &str,
        params: Value,
    ) -> Result<Value, ToolError> {
        let tool_name = self.resolve(candidate)?;
        self.invoker.invoke(ctx, &tool_name, params).await
    }
}

/// Job error text. Business failures carry the tool's own message so users
/// see e.g. "quota exceeded" rather than the error category.
pub fn failure_message(error: &ToolError) -> String {
    match error {
        ToolError::ExecutionFailed(message) => message.clone(),
        other => other.to_string(),
    }
}
