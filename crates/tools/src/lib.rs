//! Capability catalog: descriptors, registry, alias resolution and the
//! invocation boundary.

pub mod descriptor;
pub mod error;
pub mod execution_context;
pub mod invoker;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod traits;

pub use descriptor::{AuditRecord, Outcome, Tool};
pub use error::{RegistryError, ToolError};
pub use execution_context::ExecutionContext;
pub use invoker::ToolInvoker;
pub use registry::CapabilityRegistry;
pub use resolver::similarity::{
    LevenshteinScorer, SimilarityScorer, TokenOverlapScorer, TokenwiseScorer,
};
pub use resolver::{AliasEntry, AliasResolver, ResolutionTier, DEFAULT_CONFIDENCE_THRESHOLD};
pub use traits::{
    ApprovalDecision, ApprovalGate, ApprovalRequest, AuditEntry, AuditLogger, TracingAuditLogger,
};
