use anyhow::Context;
use deep_researcher::cli::init::{self, InitConfig, InitResult};
use deep_researcher::cli::output::Output;
use deep_researcher::cli::{Cli, Commands, LogFormatArg};
use deep_researcher::utils::toml_config::{LogFormat, ProviderConfig, ResearcherConfig};
use deep_researcher::{ReportCoordinator, RunOutput};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    // A missing .env is fine
    dotenvy::dotenv().ok();

    if let Err(e) = dispatch(cli, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli, output: &Output) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init {
            path,
            force,
            provider,
        } => match init::run(
            InitConfig {
                path,
                force,
                provider,
            },
            output,
        ) {
            InitResult::Success => Ok(()),
            InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => Err(anyhow::anyhow!(e)),
        },

        Commands::Config { validate } => show_config(&cli.config, validate, output),

        Commands::Run {
            topic,
            outline,
            outline_file,
            output: output_path,
            json,
        } => {
            let config = load_config(&cli.config, output)?;
            init_logging(&config, cli.verbose, cli.log_format);

            let outline = match (outline, outline_file) {
                (Some(outline), _) => outline,
                (None, Some(file)) => std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read outline from {}", file.display()))?,
                (None, None) => anyhow::bail!("An outline is required (--outline or --outline-file)"),
            };

            let coordinator = ReportCoordinator::from_config(&config)?;
            let run = coordinator.run(&topic, &outline).await?;
            emit_report(&run, output_path, json, output)
        }
    }
}

fn load_config(path: &Path, output: &Output) -> anyhow::Result<ResearcherConfig> {
    if !path.exists() {
        output.hint("Run 'deep-researcher init' to create a researcher.toml");
    }
    ResearcherConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn init_logging(config: &ResearcherConfig, verbose: bool, format: Option<LogFormatArg>) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = match format {
        Some(LogFormatArg::Json) => true,
        Some(LogFormatArg::Compact) => false,
        None => config.logging.format == LogFormat::Json,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn emit_report(
    run: &RunOutput,
    output_path: Option<PathBuf>,
    json: bool,
    output: &Output,
) -> anyhow::Result<()> {
    let body = if json {
        serde_json::to_string_pretty(run).context("Failed to serialize run output")?
    } else {
        run.final_report.clone()
    };

    match output_path {
        Some(path) => {
            std::fs::write(&path, body)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            output.success(&format!(
                "Report with {} sections written to {} in {:.1}s",
                run.structured_plan.len(),
                path.display(),
                run.duration_ms as f64 / 1000.0
            ));
        }
        None => println!("{}", body),
    }
    Ok(())
}

fn show_config(path: &Path, validate: bool, output: &Output) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read {} (run 'deep-researcher init' to create one)",
            path.display()
        )
    })?;
    let config = ResearcherConfig::parse(&content)?;

    output.header(&format!("Configuration: {}", path.display()));

    output.subheader("Providers");
    let mut providers: Vec<_> = config.providers.iter().collect();
    providers.sort_by_key(|(name, _)| name.as_str());
    for (name, provider) in providers {
        let detail = match provider {
            ProviderConfig::Ollama { base_url } => format!("ollama @ {}", base_url),
            ProviderConfig::OpenAI {
                api_base,
                api_key_env,
            } => format!("openai @ {} (key from {})", api_base, api_key_env),
        };
        output.kv(name, &detail);
    }

    output.subheader("Models");
    let mut models: Vec<_> = config.models.iter().collect();
    models.sort_by_key(|(name, _)| name.as_str());
    for (name, model) in models {
        output.kv(
            name,
            &format!(
                "{}/{} temperature={} max_tokens={} max_retries={}",
                model.provider, model.model, model.temperature, model.max_tokens, model.max_retries
            ),
        );
    }

    output.subheader("Workflow");
    for (step, model) in config.workflow.steps() {
        output.kv(step, model);
    }
    output.kv("max_topics", &config.workflow.max_topics.to_string());

    output.subheader("Search");
    let enabled = |on: bool| if on { "enabled" } else { "disabled" };
    output.kv("wikipedia", enabled(config.search.wikipedia.enabled));
    output.kv(
        "web",
        &format!(
            "{} ({:?})",
            enabled(config.search.web.enabled),
            config.search.web.provider
        ),
    );
    output.kv("arxiv", enabled(config.search.arxiv.enabled));

    if validate {
        output.subheader("Validation");
        let warnings = config.validate_with_warnings()?;
        for warning in &warnings {
            output.warning(&warning.to_string());
        }
        output.success(&format!("Configuration is valid ({} warnings)", warnings.len()));
    }

    Ok(())
}
