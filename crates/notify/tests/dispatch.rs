use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use zena_notify::*;
use zena_tasks::{JobEvent, JobEventKind, JobManager, JobStatus};
use zena_tools::{CapabilityRegistry, ExecutionContext, Tool, ToolError};

struct LabeledTool {
    name: &'static str,
    label: &'static str,
}

#[async_trait]
impl Tool for LabeledTool {
    fn name(&self) -> &str {
        self.name
    }

    fn label(&self) -> &str {
        self.label
    }

    fn description(&self) -> &str {
        "test capability"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _ctx: &ExecutionContext, params: Value) -> Result<Value, ToolError> {
        Ok(params)
    }
}

fn registry() -> Arc<CapabilityRegistry> {
    let mut registry = CapabilityRegistry::new();
    registry
        .register(Arc::new(LabeledTool { name: "export.contacts", label: "Contact export" }))
        .unwrap()
        .register(Arc::new(LabeledTool { name: "task.search", label: "Task search" }))
        .unwrap();
    Arc::new(registry)
}

#[derive(Default)]
struct RecordingChannel {
    fail: bool,
    sent: Mutex<Vec<(String, String, Value)>>,
}

#[async_trait]
impl RealtimeChannel for RecordingChannel {
    async fn send(&self, user_id: &str, event: &str, payload: Value) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .await
            .push((user_id.to_string(), event.to_string(), payload));
        if self.fail {
            Err(DeliveryError::NotConnected(user_id.to_string()))
        } else {
            Ok(())
        }
    }
}

impl RecordingChannel {
    async fn wait_for(&self, count: usize) -> Vec<(String, String, Value)> {
        for _ in 0..100 {
            {
                let sent = self.sent.lock().await;
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.sent.lock().await.clone()
    }
}

#[tokio::test]
async fn test_failure_notification_reaches_owner() {
    let manager = JobManager::new();
    let channel = Arc::new(RecordingChannel::default());
    let dispatcher = Arc::new(NotificationDispatcher::new(registry(), channel.clone()));
    dispatcher.attach(&manager);

    let job = manager.create_job("export.contacts", "agent-7").await.unwrap();
    manager.mark_running(&job.id).await.unwrap();
    manager.mark_failed(&job.id, "quota exceeded").await.unwrap();

    let sent = channel.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    let (user, event, payload) = &sent[0];
    assert_eq!(user, "agent-7");
    assert_eq!(event, EVENT_JOB_FAILED);
    assert_eq!(payload["job_id"], job.id.as_str());
    assert_eq!(payload["label"], "Contact export");
    assert_eq!(payload["error"], "quota exceeded");
    assert_eq!(payload["status"], "failed");
    assert!(payload["message"].as_str().unwrap().contains("quota exceeded"));
    assert!(payload.get("result").is_none());
}

#[tokio::test]
async fn test_delivery_failure_is_not_retried() {
    let manager = JobManager::new();
    let channel = Arc::new(RecordingChannel { fail: true, ..Default::default() });
    let dispatcher = Arc::new(NotificationDispatcher::new(registry(), channel.clone()));
    dispatcher.attach(&manager);

    let job = manager.create_job("export.contacts", "offline-user").await.unwrap();
    manager.mark_failed(&job.id, "quota exceeded").await.unwrap();

    channel.wait_for(1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(channel.sent.lock().await.len(), 1);

    let stored = manager.get_job(&job.id).await.unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_completed_notification_through_user_hub() {
    let manager = JobManager::new();
    let hub = Arc::new(UserChannelHub::new());
    let mut rx = hub.connect("u1");
    let dispatcher = Arc::new(NotificationDispatcher::new(registry(), hub.clone()));
    dispatcher.attach(&manager);

    let job = manager.create_job("task.search", "u1").await.unwrap();
    manager.mark_running(&job.id).await.unwrap();
    manager.mark_completed(&job.id, json!({"hits": 4})).await.unwrap();

    let message = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    assert_eq!(message.event, EVENT_JOB_COMPLETED);

    let notification: Notification = serde_json::from_value(message.payload).unwrap();
    assert_eq!(notification.job_id, job.id);
    assert_eq!(notification.label, "Task search");
    assert_eq!(notification.message, "Task search completed");
    assert_eq!(notification.result, Some(json!({"hits": 4})));
    assert!(notification.error.is_none());
}

#[tokio::test]
async fn test_label_falls_back_to_canonical_name() {
    let dispatcher = NotificationDispatcher::new(registry(), Arc::new(RecordingChannel::default()));
    assert_eq!(dispatcher.label_for("task.search"), "Task search");
    assert_eq!(dispatcher.label_for("calendar.create_event"), "calendar.create_event");

    let mut job = zena_tasks::Job::new("j1".into(), "legacy.sync".into(), "u1".into());
    job.status = JobStatus::Failed;
    job.error = Some("gone".into());
    let notification = dispatcher.format(&JobEvent { kind: JobEventKind::Failed, job });
    assert_eq!(notification.label, "legacy.sync");
    assert_eq!(notification.message, "legacy.sync failed: gone");
}

#[tokio::test]
async fn test_dispatch_reports_delivery_error() {
    let hub = Arc::new(UserChannelHub::new());
    let dispatcher = NotificationDispatcher::new(registry(), hub);

    let mut job = zena_tasks::Job::new("j1".into(), "task.search".into(), "nobody".into());
    job.status = JobStatus::Completed;
    job.result = Some(json!([]));
    let err = dispatcher
        .dispatch(&JobEvent { kind: JobEventKind::Completed, job })
        .await
        .unwrap_err();
    assert_eq!(err, DeliveryError::NotConnected("nobody".into()));
}
