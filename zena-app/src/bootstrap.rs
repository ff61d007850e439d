use crate::approval::ConfigApprovalGate;
use crate::config::Config;
use crate::orchestrator::Orchestrator;
use crate::tools::{self, DemoStore};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;
use zena_infra::AuditLogger;
use zena_notify::{NotificationDispatcher, UserChannelHub};
use zena_tasks::JobManager;
use zena_tools::{AliasResolver, CapabilityRegistry, ExecutionContext, ToolInvoker};

/// Everything a running process needs, wired together.
pub struct Services {
    pub config: Config,
    pub store: Arc<DemoStore>,
    pub registry: Arc<CapabilityRegistry>,
    pub jobs: JobManager,
    pub hub: Arc<UserChannelHub>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub orchestrator: Arc<Orchestrator>,
}

pub fn build_registry(store: Arc<DemoStore>) -> Result<CapabilityRegistry> {
    let mut registry = CapabilityRegistry::new();
    tools::register_builtin(&mut registry, store)
        .context("Failed to register built-in capabilities")?;
    Ok(registry)
}

pub async fn build(config: Config) -> Result<Services> {
    build_with_store(config, Arc::new(DemoStore::seeded())).await
}

pub async fn build_with_store(config: Config, store: Arc<DemoStore>) -> Result<Services> {
    config.validate()?;

    let registry = Arc::new(build_registry(store.clone())?);
    info!("Registered {} capabilities", registry.count());

    let audit = Arc::new(
        AuditLogger::new(&config.audit_log)
            .with_context(|| format!("Failed to open audit log {}", config.audit_log.display()))?,
    );

    let jobs = match &config.jobs_state_file {
        Some(path) => {
            let jobs = JobManager::with_state_file(path);
            jobs.restore()
                .await
                .with_context(|| format!("Failed to restore jobs from {}", path.display()))?;
            jobs
        }
        None => JobManager::new(),
    };

    let resolver = Arc::new(
        AliasResolver::new(registry.clone()).with_threshold(config.resolver_threshold),
    );
    let invoker = Arc::new(
        ToolInvoker::new(registry.clone(), audit)
            .with_approval_gate(Arc::new(ConfigApprovalGate::new(config.auto_approve.clone()))),
    );

    let hub = Arc::new(UserChannelHub::new());
    let dispatcher = Arc::new(NotificationDispatcher::new(registry.clone(), hub.clone()));
    dispatcher.attach(&jobs);

    let orchestrator = Arc::new(Orchestrator::new(resolver, invoker, jobs.clone()));

    Ok(Services {
        config,
        store,
        registry,
        jobs,
        hub,
        dispatcher,
        orchestrator,
    })
}

impl Services {
    /// Context for a local operator: holds every permission any registered
    /// capability declares.
    pub fn operator_context(&self, user_id: &str) -> ExecutionContext {
        let permissions: BTreeSet<String> = self
            .registry
            .get_all_tools()
            .iter()
            .flat_map(|tool| tool.permissions())
            .collect();
        ExecutionContext::new(user_id, self.config.tool_timeout_ms).with_permissions(permissions)
    }
}
