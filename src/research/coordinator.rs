use crate::llm::StepClients;
use crate::research::planner::PlanGenerator;
use crate::research::report::{assemble_final_report, combine_written_sections};
use crate::research::researcher::ResearcherUnit;
use crate::research::search_unit::SearchUnit;
use crate::research::writer::SectionWriter;
use crate::tools::SearchToolRegistry;
use crate::types::{AppError, Result};
use crate::utils::toml_config::ResearcherConfig;
use crate::workflows::engine::{RunOutput, StepTimer};
use crate::workflows::fanout::{FanInPolicy, scatter_gather};
use crate::workflows::routing::{Route, route_after_plan};
use crate::workflows::state::{OrchestratorState, merge};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Root graph: plan, research, write and assemble one report
pub struct ReportCoordinator {
    planner: PlanGenerator,
    researcher: Arc<ResearcherUnit>,
    writer: Arc<SectionWriter>,
}

impl ReportCoordinator {
    pub fn new(clients: StepClients, tools: Arc<SearchToolRegistry>, max_topics: usize) -> Self {
        let search_unit = Arc::new(SearchUnit::new(clients.search_query.clone(), tools));
        Self {
            planner: PlanGenerator::new(clients.planner.clone(), clients.plan_schema.clone()),
            researcher: Arc::new(ResearcherUnit::new(
                clients.topics.clone(),
                clients.section_writer.clone(),
                search_unit,
                max_topics,
            )),
            writer: Arc::new(SectionWriter::new(clients.plain_writer)),
        }
    }

    pub fn from_config(config: &ResearcherConfig) -> Result<Self> {
        let clients = StepClients::from_config(config)?;
        let tools = SearchToolRegistry::from_config(&config.search)?;
        if tools.is_empty() {
            return Err(AppError::Configuration("No search backend is enabled".to_string()));
        }
        Ok(Self::new(clients, Arc::new(tools), config.workflow.max_topics))
    }

    /// Generate a report for `main_topic` following `outline`
    pub async fn run(&self, main_topic: &str, outline: &str) -> Result<RunOutput> {
        if main_topic.trim().is_empty() {
            return Err(AppError::InvalidInput("main topic must not be empty".to_string()));
        }
        if outline.trim().is_empty() {
            return Err(AppError::InvalidInput("outline must not be empty".to_string()));
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("research_run", run_id = %run_id);
        self.execute(run_id, main_topic, outline).instrument(span).await
    }

    async fn execute(&self, run_id: String, main_topic: &str, outline: &str) -> Result<RunOutput> {
        let started = Instant::now();
        let mut state = OrchestratorState::new(main_topic, outline);
        tracing::info!(main_topic, "Starting research run");

        // Planning
        let timer = StepTimer::start("generate_plan");
        let plan_in_text = self.planner.generate_plan(main_topic, outline).await?;
        state.record(timer.finish(format!("{} characters", plan_in_text.len())));

        let timer = StepTimer::start("generate_plan_schema");
        let sections = self.planner.generate_plan_schema(&plan_in_text).await?;
        merge::last_write_wins(&mut state.plan_in_text, plan_in_text);
        tracing::info!(
            sections = sections.len(),
            searched = sections.iter().filter(|s| s.web_search_required).count(),
            "Plan ready"
        );
        state.record(timer.finish(format!("{} sections", sections.len())));
        merge::last_write_wins(&mut state.structured_plan, sections);

        // Routing
        let timer = StepTimer::start("web_search_required_routing");
        let route = route_after_plan(state.plan());
        merge::last_write_wins(&mut state.route, route);
        tracing::info!(%route, "Route selected");
        state.record(timer.finish(route.as_str()));

        if route == Route::WebSearchRequired {
            self.write_sections_with_search(&mut state).await?;
        }

        let timer = StepTimer::start("combine_written_sections");
        let combined = combine_written_sections(&state.compiled_sections);
        state.record(timer.finish(format!("{} sections", state.compiled_sections.len())));
        merge::last_write_wins(&mut state.combined_written_sections, combined);

        self.write_sections_without_search(&mut state).await?;

        let timer = StepTimer::start("write_final_report");
        let final_report = assemble_final_report(state.plan(), &state.compiled_sections)?;
        state.record(timer.finish(format!("{} characters", final_report.len())));
        merge::last_write_wins(&mut state.final_report, final_report.clone());

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(duration_ms, sections = state.compiled_sections.len(), "Report complete");

        Ok(RunOutput {
            run_id,
            final_report,
            structured_plan: state.structured_plan.unwrap_or_default(),
            route,
            search_results: state.search_results.len(),
            steps: state.steps,
            duration_ms,
        })
    }

    /// Researcher wave: one unit per section that needs searching
    async fn write_sections_with_search(&self, state: &mut OrchestratorState) -> Result<()> {
        let timer = StepTimer::start("write_sections_with_search");
        let inputs = state.dispatch_researchers();
        let width = inputs.len();
        tracing::info!(width, "Dispatching researchers");

        let researcher = self.researcher.clone();
        let fan_in = scatter_gather("researchers", inputs, FanInPolicy::FailFast, move |input| {
            let researcher = researcher.clone();
            async move { researcher.run(input).await }
        })
        .await?;

        if fan_in.len() != width {
            return Err(AppError::Internal(format!(
                "researcher wave returned {} of {} sections",
                fan_in.len(),
                width
            )));
        }
        for output in fan_in.contributions {
            state.merge_researcher(output);
        }

        state.record(timer.finish(format!(
            "{} sections, {} search results",
            width,
            state.search_results.len()
        )));
        Ok(())
    }

    /// Writer wave: one writer per section that needs no searching
    async fn write_sections_without_search(&self, state: &mut OrchestratorState) -> Result<()> {
        let timer = StepTimer::start("write_sections_without_search");
        let inputs = state.dispatch_writers();
        let width = inputs.len();
        tracing::info!(width, "Dispatching writers");

        let writer = self.writer.clone();
        let fan_in = scatter_gather("writers", inputs, FanInPolicy::FailFast, move |input| {
            let writer = writer.clone();
            async move { writer.write_without_search(input).await }
        })
        .await?;

        if fan_in.len() != width {
            return Err(AppError::Internal(format!(
                "writer wave returned {} of {} sections",
                fan_in.len(),
                width
            )));
        }
        for section in fan_in.contributions {
            state.merge_written(section);
        }

        state.record(timer.finish(format!("{} sections", width)));
        Ok(())
    }
}
