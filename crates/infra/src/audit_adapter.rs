use crate::audit_logger::AuditLogger;
use async_trait::async_trait;
use tracing::warn;
use zena_tools::{AuditEntry, AuditLogger as AuditSink};

#[async_trait]
impl AuditSink for AuditLogger {
    async fn log(&self, entry: AuditEntry) {
        if let Err(e) = AuditLogger::log(self, &entry) {
            warn!(
                "Failed to write audit entry {} to {}: {}",
                entry.audit_ref,
                self.path().display(),
                e
            );
        }
    }
}
