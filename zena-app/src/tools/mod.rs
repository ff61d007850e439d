//! Built-in capabilities backed by an in-memory [`DemoStore`].

pub mod calendar;
pub mod contact;
pub mod export;
pub mod store;
pub mod task;

pub use calendar::CreateEventTool;
pub use contact::{CreateContactTool, SearchContactsTool};
pub use export::ExportContactsTool;
pub use store::DemoStore;
pub use task::SearchTasksTool;

use std::sync::Arc;
use zena_tools::{CapabilityRegistry, RegistryError};

/// Register every built-in capability. Fails on the first duplicate name.
pub fn register_builtin(
    registry: &mut CapabilityRegistry,
    store: Arc<DemoStore>,
) -> Result<(), RegistryError> {
    registry
        .register(Arc::new(CreateEventTool::new(store.clone())))?
        .register(Arc::new(CreateContactTool::new(store.clone())))?
        .register(Arc::new(SearchContactsTool::new(store.clone())))?
        .register(Arc::new(ExportContactsTool::new(store.clone())))?
        .register(Arc::new(SearchTasksTool::new(store)))?;
    Ok(())
}
