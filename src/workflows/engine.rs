//! Run records
//!
//! Every workflow node leaves a [`WorkflowStep`] behind; a finished run is
//! summarised in a [`RunOutput`].

use crate::types::SectionPlan;
use crate::workflows::routing::Route;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Output from a report run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// Correlates log lines with this run
    pub run_id: String,
    /// The assembled report
    pub final_report: String,
    /// Sections as planned, in plan order
    pub structured_plan: Vec<SectionPlan>,
    /// Routing decision taken after planning
    pub route: Route,
    /// Number of search results gathered across the run
    pub search_results: usize,
    /// Trace of executed nodes, in completion order
    pub steps: Vec<WorkflowStep>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

/// A single node execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Node that executed this step
    pub node: String,
    /// Short description of what the node produced
    pub detail: String,
    /// Unix timestamp when this step finished
    pub timestamp: i64,
    /// Duration of this step in milliseconds
    pub duration_ms: u64,
}

/// Times one node and turns it into a [`WorkflowStep`]
pub struct StepTimer {
    node: &'static str,
    started: Instant,
}

impl StepTimer {
    pub fn start(node: &'static str) -> Self {
        Self {
            node,
            started: Instant::now(),
        }
    }

    pub fn finish(self, detail: impl Into<String>) -> WorkflowStep {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let detail = detail.into();
        tracing::debug!(node = self.node, duration_ms, detail = %detail, "Step finished");
        WorkflowStep {
            node: self.node.to_string(),
            detail,
            timestamp: Utc::now().timestamp(),
            duration_ms,
        }
    }
}
