//! Init command implementation
//!
//! Scaffolds a `researcher.toml` and `.env.example` for a new project.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// researcher.toml already exists
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// LLM provider to configure (ollama or openai)
    pub provider: String,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing deep-researcher");

    let base_path = &config.path;
    if !base_path.exists()
        && let Err(e) = fs::create_dir_all(base_path)
    {
        output.error(&format!("Failed to create {}: {}", base_path.display(), e));
        return InitResult::Error(e.to_string());
    }

    let config_path = base_path.join("researcher.toml");
    if config_path.exists() && !config.force {
        output.warning("researcher.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.subheader("Creating configuration files");

    let toml_content = generate_researcher_toml(&config.provider);
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create researcher.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "researcher.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    output.complete("deep-researcher initialized successfully!");

    output.header("Next Steps");
    output.newline();
    if config.provider == "openai" {
        output.info("1. Set OPENAI_API_KEY:");
        output.command("cp .env.example .env");
    } else {
        output.info("1. Start Ollama and pull the model:");
        output.command("ollama serve");
        output.command("ollama pull llama3.1");
    }
    output.newline();
    output.info("2. Research a topic:");
    output.command("deep-researcher run --topic \"Fusion power\" --outline \"History, tokamaks, outlook\"");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_researcher_toml(provider: &str) -> String {
    let (provider_section, provider_name, model, schema_model) = if provider == "openai" {
        (
            r#"# OpenAI API (set OPENAI_API_KEY in .env)
[providers.openai]
type = "openai"
api_key_env = "OPENAI_API_KEY"
api_base = "https://api.openai.com/v1"
"#,
            "openai",
            "gpt-4o-mini",
            "gpt-4o",
        )
    } else {
        (
            r#"# Ollama - local inference (no API key required)
[providers.local]
type = "ollama"
base_url = "http://localhost:11434"
"#,
            "local",
            "llama3.1",
            "llama3.1",
        )
    };

    format!(
        r#"# deep-researcher configuration

[logging]
level = "info"
format = "compact"

{provider_section}
# Writing and planning
[models.default]
provider = "{provider_name}"
model = "{model}"
temperature = 0.2
max_tokens = 2048
max_retries = 3

# Deterministic extraction of structured output
[models.strict]
provider = "{provider_name}"
model = "{schema_model}"
temperature = 0.0
max_tokens = 2048
max_retries = 3

[workflow]
planner = "default"
plan_schema = "strict"
search_query = "strict"
topics = "strict"
section_writer = "default"
plain_writer = "default"
max_topics = 3

[search.wikipedia]
enabled = true
max_results = 3

[search.web]
enabled = true
provider = "duckduckgo"   # or "tavily" (set TAVILY_API_KEY)
max_results = 2

[search.arxiv]
enabled = true
max_results = 3
"#
    )
}

fn generate_env_example() -> String {
    r#"# deep-researcher environment
# Copy to .env and fill in the keys you need

# OpenAI-compatible providers
OPENAI_API_KEY=

# Tavily web search (only with search.web.provider = "tavily")
TAVILY_API_KEY=

# Log filter, overrides [logging] level
RUST_LOG=info
"#
    .to_string()
}
