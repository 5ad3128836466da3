use crate::types::SectionPlan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the orchestrator goes after planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// At least one section needs research; run the researcher wave first
    WebSearchRequired,
    /// No section needs research; go straight to writing
    NoWebSearchRequired,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::WebSearchRequired => "web_search_required",
            Route::NoWebSearchRequired => "no_web_search_required",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide the route for a plan
pub fn route_after_plan(plan: &[SectionPlan]) -> Route {
    if plan.iter().any(|section| section.web_search_required) {
        Route::WebSearchRequired
    } else {
        Route::NoWebSearchRequired
    }
}
