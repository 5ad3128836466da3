//! Per-level run state and the merge rules applied at every fan-in
//!
//! Each graph level owns one state value. Children receive an input projection
//! built at dispatch and hand back an output projection holding only what they
//! produced; the parent folds those in with the field's merge rule:
//!
//! | field                          | rule              |
//! |--------------------------------|-------------------|
//! | `main_topic`, `outline`, plan  | last-write-wins   |
//! | `search_results`               | append            |
//! | `queries_used`                 | union             |
//! | `compiled_sections`, `steps`   | append            |

use crate::types::{AppError, QueryKey, Result, SearchResult, SectionPlan, WrittenSection};
use crate::workflows::engine::WorkflowStep;
use crate::workflows::routing::Route;
use std::collections::HashSet;

/// Field merge functions
pub mod merge {
    /// Accumulate every contributed item, keeping arrival order
    pub fn append<T>(acc: &mut Vec<T>, contribution: impl IntoIterator<Item = T>) {
        acc.extend(contribution);
    }

    /// Accumulate items not already present; returns how many were added
    pub fn union<T: PartialEq>(acc: &mut Vec<T>, contribution: impl IntoIterator<Item = T>) -> usize {
        let before = acc.len();
        for item in contribution {
            if !acc.contains(&item) {
                acc.push(item);
            }
        }
        acc.len() - before
    }

    /// Replace the slot's value, returning the previous one
    pub fn last_write_wins<T>(slot: &mut Option<T>, value: T) -> Option<T> {
        slot.replace(value)
    }
}

// ============= Search Unit =============

/// Child-scoped input for one search unit
#[derive(Debug, Clone)]
pub struct SearchUnitInput {
    pub topic: String,
    pub section_title: String,
    /// Snapshot of the researcher's executed queries at spawn time
    pub queries_already_used: Vec<QueryKey>,
}

/// What a search unit hands back: only what it executed itself
#[derive(Debug, Clone, Default)]
pub struct SearchUnitOutput {
    pub search_results: Vec<SearchResult>,
    pub queries_used: Vec<QueryKey>,
}

// ============= Researcher Unit =============

/// Input projection from the orchestrator to one researcher
#[derive(Debug, Clone)]
pub struct ResearcherInput {
    pub section: SectionPlan,
    /// Orchestrator-level results gathered before dispatch
    pub prior_results: Vec<SearchResult>,
    pub queries_already_used: Vec<QueryKey>,
}

#[derive(Debug)]
pub struct ResearcherState {
    pub section: SectionPlan,
    pub topics: Vec<String>,
    /// Results known before this researcher started; never re-contributed
    pub prior_results: Vec<SearchResult>,
    inherited_queries: HashSet<QueryKey>,
    /// Results gathered by this researcher's search units
    pub search_results: Vec<SearchResult>,
    /// Queries executed by this researcher's search units
    pub queries_used: Vec<QueryKey>,
    pub steps: Vec<WorkflowStep>,
}

/// Outcome of folding one search unit into a researcher
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub results_added: usize,
    pub queries_added: usize,
    /// Results dropped because a sibling already contributed the same query
    pub results_dropped: usize,
}

impl ResearcherState {
    pub fn new(input: ResearcherInput) -> Self {
        Self {
            section: input.section,
            topics: Vec::new(),
            prior_results: input.prior_results,
            inherited_queries: input.queries_already_used.into_iter().collect(),
            search_results: Vec::new(),
            queries_used: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Every query executed in this scope, inherited or local
    pub fn all_queries(&self) -> Vec<QueryKey> {
        let mut all: Vec<QueryKey> = self.inherited_queries.iter().cloned().collect();
        all.sort();
        merge::union(&mut all, self.queries_used.iter().cloned());
        all
    }

    /// One search unit input per topic, each with the same query snapshot
    pub fn dispatch_search_units(&self) -> Vec<SearchUnitInput> {
        let snapshot = self.all_queries();
        self.topics
            .iter()
            .map(|topic| SearchUnitInput {
                topic: topic.clone(),
                section_title: self.section.title.clone(),
                queries_already_used: snapshot.clone(),
            })
            .collect()
    }

    /// Fold one search unit's contribution into this researcher.
    ///
    /// A query a sibling already contributed is dropped along with its
    /// results. A query that was in the spawn-time snapshot means the unit
    /// ignored its dedup context and yields [`AppError::DedupViolation`].
    pub fn merge_search_unit(&mut self, output: SearchUnitOutput) -> Result<MergeStats> {
        let mut stats = MergeStats::default();
        let mut duplicates = HashSet::new();

        for key in output.queries_used {
            if self.inherited_queries.contains(&key) {
                return Err(AppError::DedupViolation {
                    tool: key.engine.tool_name().to_string(),
                    query: key.query,
                });
            }
            if self.queries_used.contains(&key) {
                tracing::warn!(query = %key, section = %self.section.title, "Sibling already executed query, dropping results");
                duplicates.insert(key);
            } else {
                self.queries_used.push(key);
                stats.queries_added += 1;
            }
        }

        let (dropped, kept): (Vec<_>, Vec<_>) = output
            .search_results
            .into_iter()
            .partition(|result| duplicates.contains(&result.key()));
        stats.results_dropped = dropped.len();
        stats.results_added = kept.len();
        merge::append(&mut self.search_results, kept);

        Ok(stats)
    }

    /// Assert that no (tool, query) pair was executed twice in this scope
    pub fn check_dedup(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for key in &self.queries_used {
            if self.inherited_queries.contains(key) || !seen.insert(key) {
                return Err(AppError::DedupViolation {
                    tool: key.engine.tool_name().to_string(),
                    query: key.query.clone(),
                });
            }
        }
        Ok(())
    }

    /// Output projection: the written section plus only the new search state
    pub fn into_output(self, compiled_section: WrittenSection) -> ResearcherOutput {
        ResearcherOutput {
            compiled_section,
            search_results: self.search_results,
            queries_used: self.queries_used,
            steps: self.steps,
        }
    }
}

/// Output projection from one researcher to the orchestrator
#[derive(Debug, Clone)]
pub struct ResearcherOutput {
    pub compiled_section: WrittenSection,
    pub search_results: Vec<SearchResult>,
    pub queries_used: Vec<QueryKey>,
    pub steps: Vec<WorkflowStep>,
}

// ============= Non-search Writer =============

/// Input projection for one section written without searching
#[derive(Debug, Clone)]
pub struct WriterInput {
    pub section: SectionPlan,
    pub combined_written_sections: String,
    pub search_results: Vec<SearchResult>,
}

// ============= Orchestrator =============

#[derive(Debug, Default)]
pub struct OrchestratorState {
    pub main_topic: Option<String>,
    pub outline: Option<String>,
    pub plan_in_text: Option<String>,
    pub structured_plan: Option<Vec<SectionPlan>>,
    pub route: Option<Route>,
    pub search_results: Vec<SearchResult>,
    pub queries_used: Vec<QueryKey>,
    pub compiled_sections: Vec<WrittenSection>,
    pub combined_written_sections: Option<String>,
    pub final_report: Option<String>,
    pub steps: Vec<WorkflowStep>,
}

impl OrchestratorState {
    pub fn new(main_topic: impl Into<String>, outline: impl Into<String>) -> Self {
        let mut state = Self::default();
        merge::last_write_wins(&mut state.main_topic, main_topic.into());
        merge::last_write_wins(&mut state.outline, outline.into());
        state
    }

    pub fn plan(&self) -> &[SectionPlan] {
        self.structured_plan.as_deref().unwrap_or_default()
    }

    pub fn record(&mut self, step: WorkflowStep) {
        merge::append(&mut self.steps, [step]);
    }

    /// One researcher input per section that needs searching, in plan order
    pub fn dispatch_researchers(&self) -> Vec<ResearcherInput> {
        self.plan()
            .iter()
            .filter(|section| section.web_search_required)
            .map(|section| ResearcherInput {
                section: section.clone(),
                prior_results: self.search_results.clone(),
                queries_already_used: self.queries_used.clone(),
            })
            .collect()
    }

    /// One writer input per section that needs no searching, in plan order
    pub fn dispatch_writers(&self) -> Vec<WriterInput> {
        let combined = self.combined_written_sections.clone().unwrap_or_default();
        self.plan()
            .iter()
            .filter(|section| !section.web_search_required)
            .map(|section| WriterInput {
                section: section.clone(),
                combined_written_sections: combined.clone(),
                search_results: self.search_results.clone(),
            })
            .collect()
    }

    /// Fold one researcher's contribution.
    ///
    /// Results for a query another researcher already contributed are not
    /// appended again; the run-level result list stays free of repeats.
    pub fn merge_researcher(&mut self, output: ResearcherOutput) {
        let already: HashSet<QueryKey> = self.queries_used.iter().cloned().collect();
        let fresh: Vec<SearchResult> = output
            .search_results
            .into_iter()
            .filter(|result| !already.contains(&result.key()))
            .collect();

        merge::append(&mut self.search_results, fresh);
        merge::union(&mut self.queries_used, output.queries_used);
        merge::append(&mut self.compiled_sections, [output.compiled_section]);
        merge::append(&mut self.steps, output.steps);
    }

    pub fn merge_written(&mut self, section: WrittenSection) {
        merge::append(&mut self.compiled_sections, [section]);
    }
}
