//! Researcher graph: topics for one section, parallel search units, section write-up

use crate::llm::LLMClient;
use crate::llm::structured::generate_structured;
use crate::research::prompts;
use crate::research::search_unit::SearchUnit;
use crate::types::{Result, TopicList, WrittenSection};
use crate::utils::toml_config::MAX_TOPICS_PER_SECTION;
use crate::workflows::engine::StepTimer;
use crate::workflows::fanout::{FanInPolicy, scatter_gather};
use crate::workflows::state::{ResearcherInput, ResearcherOutput, ResearcherState};
use std::sync::Arc;

pub struct ResearcherUnit {
    topics_llm: Arc<dyn LLMClient>,
    writer_llm: Arc<dyn LLMClient>,
    search_unit: Arc<SearchUnit>,
    max_topics: usize,
}

impl ResearcherUnit {
    pub fn new(
        topics_llm: Arc<dyn LLMClient>,
        writer_llm: Arc<dyn LLMClient>,
        search_unit: Arc<SearchUnit>,
        max_topics: usize,
    ) -> Self {
        let clamped = max_topics.clamp(1, MAX_TOPICS_PER_SECTION);
        if clamped != max_topics {
            tracing::warn!(max_topics, clamped, "Topic limit out of range, clamping");
        }
        Self {
            topics_llm,
            writer_llm,
            search_unit,
            max_topics: clamped,
        }
    }

    pub async fn run(&self, input: ResearcherInput) -> Result<ResearcherOutput> {
        let mut state = ResearcherState::new(input);
        let title = state.section.title.clone();

        let timer = StepTimer::start("get_important_topics");
        state.topics = self.get_important_topics(&state).await?;
        state
            .steps
            .push(timer.finish(format!("{}: {} topics", title, state.topics.len())));

        let timer = StepTimer::start("execute_search_units");
        let unit = self.search_unit.clone();
        let fan_in = scatter_gather(
            "search_units",
            state.dispatch_search_units(),
            FanInPolicy::Partial,
            move |input| {
                let unit = unit.clone();
                async move { unit.run(input).await }
            },
        )
        .await?;

        let units = fan_in.len();
        for contribution in fan_in.contributions {
            state.merge_search_unit(contribution)?;
        }
        state.check_dedup()?;
        state.steps.push(timer.finish(format!(
            "{}: {} units, {} results, {} failed",
            title,
            units,
            state.search_results.len(),
            fan_in.failures.len()
        )));

        let timer = StepTimer::start("section_writer");
        let written = self.section_writer(&state).await?;
        state.steps.push(timer.finish(title));

        Ok(state.into_output(written))
    }

    /// Sub-topics to search, capped at `max_topics`
    async fn get_important_topics(&self, state: &ResearcherState) -> Result<Vec<String>> {
        let list: TopicList = generate_structured(
            self.topics_llm.as_ref(),
            "get_important_topics",
            prompts::TOPICS_SYSTEM,
            &prompts::topics_prompt(&state.section.title, &state.section.overview),
        )
        .await?;

        Ok(cap_topics(list.topics, self.max_topics, &state.section.title))
    }

    /// Write the section from every result merged at fan-in
    async fn section_writer(&self, state: &ResearcherState) -> Result<WrittenSection> {
        let mut results = state.prior_results.clone();
        results.extend(state.search_results.iter().cloned());

        let mut written: WrittenSection = generate_structured(
            self.writer_llm.as_ref(),
            "section_writer",
            prompts::SECTION_WRITER_SYSTEM,
            &prompts::section_writer_prompt(&state.section.title, &state.section.overview, &results),
        )
        .await?;

        // Section identity comes from the plan, not the model
        written.title = state.section.title.clone();
        Ok(written)
    }
}

/// Drop blank and repeated topics, then truncate to `max_topics`.
///
/// The limit never exceeds [`MAX_TOPICS_PER_SECTION`].
pub fn cap_topics(topics: Vec<String>, max_topics: usize, section: &str) -> Vec<String> {
    let max_topics = max_topics.min(MAX_TOPICS_PER_SECTION);
    let mut kept: Vec<String> = Vec::new();
    for topic in topics {
        let topic = topic.trim().to_string();
        if !topic.is_empty() && !kept.contains(&topic) {
            kept.push(topic);
        }
    }
    if kept.len() > max_topics {
        tracing::warn!(
            section,
            identified = kept.len(),
            max_topics,
            "Too many topics identified, truncating"
        );
        kept.truncate(max_topics);
    }
    kept
}
