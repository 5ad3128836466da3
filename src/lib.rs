//! # deep-researcher
//!
//! Generates long-form research reports from a topic and an outline by
//! orchestrating language-model calls and web/academic searches.
//!
//! ## Overview
//!
//! A run is three nested workflow graphs:
//!
//! 1. **Orchestrator** - plans the report, routes on whether any section needs
//!    searching, runs a researcher wave and then a writer wave, and assembles
//!    the report
//! 2. **Researcher unit** - identifies up to three sub-topics for one section,
//!    fans out one search unit per topic and writes the section from everything
//!    they found
//! 3. **Search unit** - lets the model pick search tool calls for one topic and
//!    executes the ones not already run in its researcher's scope
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use deep_researcher::{ReportCoordinator, ResearcherConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResearcherConfig::load("researcher.toml")?;
//!     let coordinator = ReportCoordinator::from_config(&config)?;
//!
//!     let output = coordinator
//!         .run("Solid-state batteries", "History, chemistry, outlook")
//!         .await?;
//!     println!("{}", output.final_report);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `openai` | OpenAI API and compatible endpoints |
//! | `all-llm` | Both providers |
//!
//! ## Modules
//!
//! - [`llm`] - LLM client implementations and structured output
//! - [`tools`] - Search backends and their registry
//! - [`workflows`] - State merge rules, scatter-gather, routing, run records
//! - [`research`] - The report workflow itself
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line interface helpers.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Report research workflow.
pub mod research;
/// Search backends.
pub mod tools;
/// Core types and errors.
pub mod types;
/// Configuration utilities.
pub mod utils;
/// Workflow orchestration primitives.
pub mod workflows;

// Re-export commonly used types
pub use llm::{LLMClient, LLMResponse, ModelParams, Provider, ProviderRegistry, StepClients};
pub use research::ReportCoordinator;
pub use tools::{SearchTool, SearchToolRegistry};
pub use types::{AppError, Result};
pub use utils::toml_config::ResearcherConfig;
pub use workflows::{Route, RunOutput, WorkflowStep};
