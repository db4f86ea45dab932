//! Port synchronization module
//!
//! The reconciler decides what one pass does; the scheduler decides when
//! passes run; the service wires both to configuration and the real
//! collaborators.

pub mod reconciler;
pub mod scheduler;
pub mod service;

// Public re-exports
pub use reconciler::{ReconciliationOutcome, Reconciler};
pub use scheduler::{PassReport, ReconcilePass, Scheduler, SchedulerCommand, SchedulerHandle};
pub use service::PortSyncService;
