//! Report text assembly

use crate::types::{AppError, Result, SectionPlan, WrittenSection};
use std::collections::HashMap;

pub fn format_section(section: &WrittenSection) -> String {
    format!(
        "Section: {}\nContent: {}\nSources: {}\n\n",
        section.title, section.content, section.sources
    )
}

/// Shared context for the non-search wave: every section written so far
pub fn combine_written_sections(sections: &[WrittenSection]) -> String {
    sections.iter().map(format_section).collect()
}

/// Concatenate the written sections into the final report.
///
/// Every planned section must appear exactly once; anything else means a
/// branch was lost or merged twice.
pub fn assemble_final_report(plan: &[SectionPlan], sections: &[WrittenSection]) -> Result<String> {
    if sections.len() != plan.len() {
        return Err(AppError::Internal(format!(
            "report has {} sections but the plan has {}",
            sections.len(),
            plan.len()
        )));
    }

    let mut expected: HashMap<&str, usize> = HashMap::new();
    for section in plan {
        *expected.entry(section.title.as_str()).or_default() += 1;
    }
    for section in sections {
        match expected.get_mut(section.title.as_str()) {
            Some(remaining) if *remaining > 0 => *remaining -= 1,
            _ => {
                return Err(AppError::Internal(format!(
                    "section '{}' is not in the plan or was written twice",
                    section.title
                )));
            }
        }
    }

    Ok(combine_written_sections(sections))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(title: &str) -> WrittenSection {
        WrittenSection {
            title: title.to_string(),
            content: format!("{} body", title),
            sources: "https://example.org".to_string(),
        }
    }

    #[test]
    fn test_combine_format() {
        let text = combine_written_sections(&[written("A"), written("B")]);
        assert_eq!(
            text,
            "Section: A\nContent: A body\nSources: https://example.org\n\n\
             Section: B\nContent: B body\nSources: https://example.org\n\n"
        );
        assert_eq!(combine_written_sections(&[]), "");
    }

    #[test]
    fn test_assemble_requires_one_entry_per_section() {
        let plan = vec![SectionPlan::new("A", "a", true), SectionPlan::new("B", "b", false)];

        let report = assemble_final_report(&plan, &[written("A"), written("B")]).unwrap();
        assert!(report.find("Section: A").unwrap() < report.find("Section: B").unwrap());

        assert!(assemble_final_report(&plan, &[written("A")]).is_err());
        assert!(assemble_final_report(&plan, &[written("A"), written("A")]).is_err());
        assert!(assemble_final_report(&plan, &[written("A"), written("C")]).is_err());
    }
}
