//! Workflow orchestration primitives
//!
//! The report workflow is three nested graphs (search unit, researcher,
//! orchestrator). This module holds what they share: per-level state with its
//! merge rules, scatter-gather fan-out, the routing decision and run records.

/// Run records and step tracing.
pub mod engine;
/// Scatter-gather over tokio tasks.
pub mod fanout;
/// Post-planning routing decision.
pub mod routing;
/// Per-level state, projections and merge rules.
pub mod state;

pub use engine::{RunOutput, StepTimer, WorkflowStep};
pub use fanout::{FanIn, FanInPolicy, scatter_gather};
pub use routing::{Route, route_after_plan};
