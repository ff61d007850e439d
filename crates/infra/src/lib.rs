//! Durable sinks backing the capability layer.

pub mod audit_adapter;
pub mod audit_logger;

pub use audit_logger::{AuditLogger, AuditLoggerError};
