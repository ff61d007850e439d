use crate::channel::{DeliveryError, RealtimeChannel};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use zena_tasks::{HandlerError, JobEvent, JobEventHandler, JobEventKind, JobManager, JobStatus, SubscriptionId};
use zena_tools::CapabilityRegistry;

pub const EVENT_JOB_COMPLETED: &str = "job.completed";
pub const EVENT_JOB_FAILED: &str = "job.failed";

/// User-facing payload pushed when a job terminates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub job_id: String,
    pub tool_name: String,
    pub label: String,
    pub status: JobStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub fn event_name(kind: JobEventKind) -> &'static str {
    match kind {
        JobEventKind::Completed => EVENT_JOB_COMPLETED,
        JobEventKind::Failed => EVENT_JOB_FAILED,
    }
}

/// Turns terminal job events into addressed real-time notifications.
///
/// Push-only and best effort: a failed delivery is logged and dropped.
/// Replay for disconnected users is the channel's concern.
pub struct NotificationDispatcher {
    registry: Arc<CapabilityRegistry>,
    channel: Arc<dyn RealtimeChannel>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<CapabilityRegistry>, channel: Arc<dyn RealtimeChannel>) -> Self {
        Self { registry, channel }
    }

    /// Subscribe to both terminal event kinds of `manager`.
    pub fn attach(self: &Arc<Self>, manager: &JobManager) -> [SubscriptionId; 2] {
        let handler: Arc<dyn JobEventHandler> = self.clone();
        [
            manager.subscribe(JobEventKind::Completed, handler.clone()),
            manager.subscribe(JobEventKind::Failed, handler),
        ]
    }

    /// Display label for a capability, falling back to the raw name when the
    /// registry no longer knows it.
    pub fn label_for(&self, tool_name: &str) -> String {
        self.registry
            .get_tool(tool_name)
            .map(|tool| tool.label().to_string())
            .unwrap_or_else(|| tool_name.to_string())
    }

    pub fn format(&self, event: &JobEvent) -> Notification {
        let job = &event.job;
        let label = self.label_for(&job.tool_name);
        let message = match event.kind {
            JobEventKind::Completed => format!("{} completed", label),
            JobEventKind::Failed => format!(
                "{} failed: {}",
                label,
                job.error.as_deref().unwrap_or("unknown error")
            ),
        };

        Notification {
            job_id: job.id.clone(),
            tool_name: job.tool_name.clone(),
            label,
            status: job.status,
            message,
            result: job.result.clone(),
            error: job.error.clone(),
            timestamp: job.terminated_at.unwrap_or(job.updated_at),
        }
    }

    /// Format and push one event. Exactly one send attempt is made.
    pub async fn dispatch(&self, event: &JobEvent) -> Result<Notification, DeliveryError> {
        let notification = self.format(event);
        let payload = serde_json::to_value(&notification)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        self.channel
            .send(&event.job.user_id, event_name(event.kind), payload)
            .await?;

        debug!("Notified {} about job {}", event.job.user_id, event.job.id);
        Ok(notification)
    }
}

#[async_trait]
impl JobEventHandler for NotificationDispatcher {
    async fn handle(&self, event: &JobEvent) -> Result<(), HandlerError> {
        if let Err(e) = self.dispatch(event).await {
            warn!("Dropped notification for job {}: {}", event.job.id, e);
        }
        Ok(())
    }
}
