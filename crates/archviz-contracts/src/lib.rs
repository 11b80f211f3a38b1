//! Data contracts shared by the archviz engine and CLI: option catalog, workflow templates,
//! model tiers, local persistence and the event log.

pub mod catalog;
pub mod events;
pub mod models;
pub mod selection;
pub mod store;
pub mod workflow;

pub use selection::{SelectionError, WorkflowSelection};
pub use workflow::{assemble, EditMode, UtilityKind, WorkflowKind};
