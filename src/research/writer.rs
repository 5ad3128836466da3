use crate::llm::LLMClient;
use crate::llm::structured::generate_structured;
use crate::research::prompts;
use crate::types::{Result, WrittenSection};
use crate::workflows::state::WriterInput;
use std::sync::Arc;

/// Writes a section from the already written ones, without searching
pub struct SectionWriter {
    llm: Arc<dyn LLMClient>,
}

impl SectionWriter {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    pub async fn write_without_search(&self, input: WriterInput) -> Result<WrittenSection> {
        let mut written: WrittenSection = generate_structured(
            self.llm.as_ref(),
            "write_sections_without_search",
            prompts::PLAIN_WRITER_SYSTEM,
            &prompts::plain_writer_prompt(
                &input.section.title,
                &input.section.overview,
                &input.combined_written_sections,
                &input.search_results,
            ),
        )
        .await?;

        written.title = input.section.title;
        Ok(written)
    }
}
