//! Two-step planning: narrative plan, then schema extraction

use crate::llm::LLMClient;
use crate::llm::structured::{generate_structured, generate_text};
use crate::research::prompts;
use crate::types::{AppError, PlannedSections, Result, SectionPlan};
use std::sync::Arc;

pub struct PlanGenerator {
    planner: Arc<dyn LLMClient>,
    schema: Arc<dyn LLMClient>,
}

impl PlanGenerator {
    pub fn new(planner: Arc<dyn LLMClient>, schema: Arc<dyn LLMClient>) -> Self {
        Self { planner, schema }
    }

    /// Expand the topic and outline into a prose plan
    pub async fn generate_plan(&self, main_topic: &str, outline: &str) -> Result<String> {
        generate_text(
            self.planner.as_ref(),
            "generate_plan",
            prompts::PLANNER_SYSTEM,
            &prompts::planner_prompt(main_topic, outline),
        )
        .await
    }

    /// Extract validated sections from a prose plan.
    ///
    /// Any failure here, including an exhausted retry budget, is a
    /// [`AppError::PlanSchema`] error.
    pub async fn generate_plan_schema(&self, plan_in_text: &str) -> Result<Vec<SectionPlan>> {
        let planned: PlannedSections = generate_structured(
            self.schema.as_ref(),
            "generate_plan_schema",
            prompts::PLAN_SCHEMA_SYSTEM,
            &prompts::plan_schema_prompt(plan_in_text),
        )
        .await
        .map_err(|e| match e {
            AppError::Synthesis { message, .. } => {
                AppError::PlanSchema(format!("could not extract sections: {}", message))
            }
            other => other,
        })?;

        validate_plan(&planned.sections)?;
        Ok(planned.sections)
    }
}

/// A plan needs at least one section and no blank titles or overviews
pub fn validate_plan(sections: &[SectionPlan]) -> Result<()> {
    if sections.is_empty() {
        return Err(AppError::PlanSchema("plan contains no sections".to_string()));
    }
    for (i, section) in sections.iter().enumerate() {
        if section.title.trim().is_empty() {
            return Err(AppError::PlanSchema(format!("section {} has an empty title", i + 1)));
        }
        if section.overview.trim().is_empty() {
            return Err(AppError::PlanSchema(format!(
                "section '{}' has an empty overview",
                section.title
            )));
        }
    }
    Ok(())
}
