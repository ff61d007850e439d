use crate::error::JobError;
use crate::events::{JobEventHandler, SubscriptionId};
use crate::job::{Job, JobEvent, JobEventKind, JobStatus};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

struct Subscription {
    id: SubscriptionId,
    kind: JobEventKind,
    handler: Arc<dyn JobEventHandler>,
}

/// Owner of the job table and the only component that mutates job state.
///
/// Every job sits behind its own mutex, so transitions of one job are
/// serialized while different jobs move independently. Handles are cheap
/// to clone and share the same table.
#[derive(Clone)]
pub struct JobManager {
    jobs: Arc<RwLock<HashMap<String, Arc<Mutex<Job>>>>>,
    subscribers: Arc<parking_lot::RwLock<Vec<Subscription>>>,
    next_subscription: Arc<AtomicU64>,
    state_file: Option<PathBuf>,
    persist_lock: Arc<Mutex<()>>,
}

impl JobManager {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            subscribers: Arc::new(parking_lot::RwLock::new(Vec::new())),
            next_subscription: Arc::new(AtomicU64::new(1)),
            state_file: None,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Snapshot the job table to `state_file` after every mutation.
    pub fn with_state_file<P: AsRef<Path>>(state_file: P) -> Self {
        Self {
            state_file: Some(state_file.as_ref().to_path_buf()),
            ..Self::new()
        }
    }

    /// Reload a snapshot written by a previous process. Jobs that were
    /// still pending or running are failed, without emitting events.
    pub async fn restore(&self) -> Result<usize, JobError> {
        let Some(state_file) = &self.state_file else {
            return Ok(0);
        };

        if !tokio::fs::try_exists(state_file).await? {
            return Ok(0);
        }

        let content = tokio::fs::read_to_string(state_file).await?;
        let mut restored: Vec<Job> = serde_json::from_str(&content)?;
        let now = chrono::Utc::now();

        for job in &mut restored {
            if !job.status.is_terminal() {
                job.status = JobStatus::Failed;
                job.error = Some("Interrupted by restart".to_string());
                job.updated_at = now;
                job.terminated_at = Some(now);
            }
        }

        let count = restored.len();
        let mut jobs = self.jobs.write().await;
        jobs.clear();
        for job in restored {
            jobs.insert(job.id.clone(), Arc::new(Mutex::new(job)));
        }
        drop(jobs);

        self.persist_state().await?;
        info!("Restored {} jobs from {}", count, state_file.display());
        Ok(count)
    }

    pub async fn create_job(
        &self,
        tool_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Job, JobError> {
        self.create_job_with_id(uuid::Uuid::new_v4().to_string(), tool_name, user_id)
            .await
    }

    pub async fn create_job_with_id(
        &self,
        id: impl Into<String>,
        tool_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Job, JobError> {
        let job = Job::new(id.into(), tool_name.into(), user_id.into());

        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(JobError::DuplicateJob(job.id));
        }
        jobs.insert(job.id.clone(), Arc::new(Mutex::new(job.clone())));
        drop(jobs);

        self.persist_quietly().await;
        info!("Created job {} for {} (user {})", job.id, job.tool_name, job.user_id);
        Ok(job)
    }

    pub async fn mark_running(&self, job_id: &str) -> Result<Job, JobError> {
        self.transition(job_id, JobStatus::Running, None, None).await
    }

    pub async fn mark_completed(&self, job_id: &str, result: Value) -> Result<Job, JobError> {
        self.transition(job_id, JobStatus::Completed, Some(result), None)
            .await
    }

    pub async fn mark_failed(
        &self,
        job_id: &str,
        error: impl Into<String>,
    ) -> Result<Job, JobError> {
        self.transition(job_id, JobStatus::Failed, None, Some(error.into()))
            .await
    }

    /// Create a job, mark it running and drive `task_fn` to completion on
    /// the runtime. Returns the running job immediately.
    ///
    /// `Ok` output completes the job, `Err` fails it with that message, and
    /// a panic fails it as well.
    pub async fn spawn_job<F, Fut>(
        &self,
        tool_name: impl Into<String>,
        user_id: impl Into<String>,
        task_fn: F,
    ) -> Result<Job, JobError>
    where
        F: FnOnce(Job) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        let job = self.create_job(tool_name, user_id).await?;
        let running = self.mark_running(&job.id).await?;

        let manager = self.clone();
        let job_id = running.id.clone();
        let task = task_fn(running.clone());

        tokio::spawn(async move {
            let outcome = match tokio::spawn(task).await {
                Ok(Ok(output)) => manager.mark_completed(&job_id, output).await,
                Ok(Err(message)) => manager.mark_failed(&job_id, message).await,
                Err(join_err) if join_err.is_panic() => {
                    error!("Job {} panicked", job_id);
                    manager.mark_failed(&job_id, "job execution panicked").await
                }
                Err(_) => manager.mark_failed(&job_id, "job execution cancelled").await,
            };
            if let Err(e) = outcome {
                warn!("Could not record outcome of job {}: {}", job_id, e);
            }
        });

        Ok(running)
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job, JobError> {
        let job = self.job_handle(job_id).await?;
        let guard = job.lock().await;
        Ok(guard.clone())
    }

    /// All jobs, oldest first.
    pub async fn list_jobs(&self) -> Vec<Job> {
        let mut result = self.snapshot().await;
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        result
    }

    pub async fn jobs_for_user(&self, user_id: &str) -> Vec<Job> {
        self.list_jobs()
            .await
            .into_iter()
            .filter(|job| job.user_id == user_id)
            .collect()
    }

    /// Drop terminal jobs from the table. Jobs whose lock is held are kept.
    pub async fn cleanup_terminated(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.try_lock() {
            Ok(guard) => !guard.status.is_terminal(),
            Err(_) => true,
        });
        let removed = before - jobs.len();
        drop(jobs);
        self.persist_quietly().await;
        removed
    }

    /// Register `handler` for every later event of `kind`. Handlers run in
    /// registration order.
    pub fn subscribe(
        &self,
        kind: JobEventKind,
        handler: Arc<dyn JobEventHandler>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push(Subscription { id, kind, handler });
        debug!("Subscribed {:?} to {} events", id, kind.as_str());
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self, kind: JobEventKind) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|s| s.kind == kind)
            .count()
    }

    async fn transition(
        &self,
        job_id: &str,
        to: JobStatus,
        result: Option<Value>,
        error: Option<String>,
    ) -> Result<Job, JobError> {
        let job = self.job_handle(job_id).await?;
        let mut guard = job.lock().await;

        let from = guard.status;
        if !from.can_transition_to(to) {
            warn!("Rejected transition for job {}: {} -> {}", job_id, from, to);
            return Err(JobError::InvalidJobTransition {
                job_id: job_id.to_string(),
                from,
                to,
            });
        }

        let now = chrono::Utc::now();
        guard.status = to;
        guard.updated_at = now;
        if to.is_terminal() {
            guard.terminated_at = Some(now);
            guard.result = result;
            guard.error = error;
        }
        let snapshot = guard.clone();

        // Handler list is captured while the job lock is held, so anyone
        // subscribed before this point sees the event.
        if let Some(kind) = JobEventKind::for_status(to) {
            self.emit(JobEvent {
                kind,
                job: snapshot.clone(),
            });
        }
        drop(guard);

        debug!("Job {}: {} -> {}", job_id, from, to);
        self.persist_quietly().await;
        Ok(snapshot)
    }

    fn emit(&self, event: JobEvent) {
        let handlers: Vec<Arc<dyn JobEventHandler>> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.kind == event.kind)
            .map(|s| s.handler.clone())
            .collect();

        if handlers.is_empty() {
            return;
        }

        // Fire and forget: the caller that triggered the transition is not
        // blocked on delivery.
        let event = Arc::new(event);
        tokio::spawn(async move {
            for handler in handlers {
                let event = event.clone();
                let job_id = event.job.id.clone();
                let outcome = tokio::spawn(async move { handler.handle(&event).await }).await;
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!("Job event handler failed for {}: {}", job_id, e),
                    Err(join_err) if join_err.is_panic() => {
                        error!("Job event handler panicked for {}", job_id)
                    }
                    Err(_) => error!("Job event handler cancelled for {}", job_id),
                }
            }
        });
    }

    async fn job_handle(&self, job_id: &str) -> Result<Arc<Mutex<Job>>, JobError> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    async fn snapshot(&self) -> Vec<Job> {
        let handles: Vec<Arc<Mutex<Job>>> = self.jobs.read().await.values().cloned().collect();
        let mut result = Vec::with_capacity(handles.len());
        for handle in handles {
            result.push(handle.lock().await.clone());
        }
        result
    }

    async fn persist_quietly(&self) {
        if let Err(e) = self.persist_state().await {
            warn!("Failed to persist job state: {}", e);
        }
    }

    async fn persist_state(&self) -> Result<(), JobError> {
        let Some(state_file) = &self.state_file else {
            return Ok(());
        };

        let _writer = self.persist_lock.lock().await;
        let snapshot = self.list_jobs().await;

        if let Some(parent) = state_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_file = temp_path(state_file);
        let content = serde_json::to_string_pretty(&snapshot)?;
        tokio::fs::write(&tmp_file, content).await?;
        tokio::fs::rename(tmp_file, state_file).await?;

        Ok(())
    }
}

/// Sibling of `state_file` with `.tmp` appended to the full file name.
fn temp_path(state_file: &Path) -> PathBuf {
    let mut name = state_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    state_file.with_file_name(name)
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}
