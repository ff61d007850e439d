use crate::job::JobEvent;
use async_trait::async_trait;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Observer of terminal job events.
///
/// A handler that errors or panics is logged and skipped; later handlers
/// for the same event still run.
#[async_trait]
pub trait JobEventHandler: Send + Sync {
    async fn handle(&self, event: &JobEvent) -> Result<(), HandlerError>;
}

/// Adapter so plain closures can subscribe.
pub struct FnHandler<F>(F);

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&JobEvent) -> Result<(), HandlerError> + Send + Sync,
{
    FnHandler(f)
}

#[async_trait]
impl<F> JobEventHandler for FnHandler<F>
where
    F: Fn(&JobEvent) -> Result<(), HandlerError> + Send + Sync,
{
    async fn handle(&self, event: &JobEvent) -> Result<(), HandlerError> {
        (self.0)(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);
