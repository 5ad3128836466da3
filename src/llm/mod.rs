//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for the language models behind each
//! workflow step. Provider-specific implementations sit behind the
//! [`LLMClient`] trait so the rest of the crate works with any of them.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`ProviderRegistry`] - Resolves named models to configured providers
//! - [`StepClients`] - The client assigned to each workflow step
//! - [`structured`] - Schema-constrained generation with a retry budget
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `ollama` - Local Ollama server (default)
//! - `openai` - OpenAI API and compatible endpoints

/// Core LLM client trait and provider selection.
pub mod client;
/// Registry for named providers and models.
pub mod provider_registry;
/// Structured output and retries.
pub mod structured;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, LLMResponse, ModelParams, Provider};
pub use provider_registry::{ProviderRegistry, StepClients};
