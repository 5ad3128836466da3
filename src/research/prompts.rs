//! Prompt text for each model-driven step

use crate::types::SearchResult;

pub const PLANNER_SYSTEM: &str = "You are a research assistant. You will be given a main topic \
and an outline. Write a plan for a report on the topic. The plan must consist of sections, each \
with a title and an overview covering the main topics and points of that section. State for \
every section whether writing it requires searching the internet.";

pub const PLAN_SCHEMA_SYSTEM: &str = "You are a research assistant. You will be given a plan for \
a report written as prose. Extract every section of the plan with its title, its overview and \
whether it requires a web search.";

pub const SEARCH_QUERY_SYSTEM: &str = "You are a research assistant. You will be given a topic and \
the report section it belongs to. Create search queries that will fetch information useful for \
writing the section. Call the most suitable of the available search tools: Wikipedia for general \
knowledge and history, web search for current or domain-specific information, arXiv for \
academic research.";

pub const TOPICS_SYSTEM: &str = "You are a research assistant. Given a section title and \
overview, identify the topics worth searching the internet for to better understand the \
section. Return at most three topics, all relevant to the section.";

pub const SECTION_WRITER_SYSTEM: &str = "You are a research assistant. You will be given a \
section title, its overview and search results. Select the useful search results and write the \
content of the section from them. List the sources you used.";

pub const PLAIN_WRITER_SYSTEM: &str = "You are a research assistant. You will be given a section \
title, its overview and the sections of the report already written. Write the content of this \
section so that it fits with the written sections.";

pub fn planner_prompt(main_topic: &str, outline: &str) -> String {
    format!("Main Topic: {}\nOutline: {}", main_topic, outline)
}

pub fn plan_schema_prompt(plan_in_text: &str) -> String {
    format!("Plan: {}", plan_in_text)
}

pub fn search_query_prompt(topic: &str, section_title: &str) -> String {
    format!("{} in {}", topic, section_title)
}

pub fn topics_prompt(title: &str, overview: &str) -> String {
    format!("Section: {}\nSection Overview: {}", title, overview)
}

pub fn section_writer_prompt(title: &str, overview: &str, results: &[SearchResult]) -> String {
    format!(
        "Section: {}\nSection Overview: {}\nSearch Results:\n{}",
        title,
        overview,
        format_search_results(results)
    )
}

pub fn plain_writer_prompt(
    title: &str,
    overview: &str,
    written_sections: &str,
    results: &[SearchResult],
) -> String {
    let mut prompt = format!(
        "Section: {}\nSection Overview: {}\nWritten Sections:\n{}",
        title, overview, written_sections
    );
    if !results.is_empty() {
        prompt.push_str("\nSources consulted so far:\n");
        for result in results {
            prompt.push_str(&format!("- {} ({})\n", result.title, result.source));
        }
    }
    prompt
}

/// Render search results as numbered blocks for a writer prompt
pub fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "(no search results)\n".to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "[{}] {} | {} | {}\nQuery: {}\n{}\n",
                i + 1,
                r.search_engine,
                r.title,
                r.source,
                r.search_query,
                r.content
            )
        })
        .collect()
}
