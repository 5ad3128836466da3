//! CLI module for deep-researcher
//!
//! Provides command-line interface parsing for the deep-researcher binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// deep-researcher - long-form research reports from a topic and an outline
#[derive(Parser, Debug)]
#[command(
    name = "deep-researcher",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Generate long-form research reports with language models and web search",
    long_about = "Plans a report from a topic and an outline, researches every section that\n\
                  needs it on Wikipedia, the web and arXiv, writes the remaining sections from\n\
                  what was found and prints the assembled report.",
    after_help = "EXAMPLES:\n    \
                  deep-researcher init                                   # Scaffold researcher.toml\n    \
                  deep-researcher run -t \"Fusion power\" -o \"History, tokamaks, outlook\"\n    \
                  deep-researcher run -t \"CRDTs\" --outline-file outline.md --output report.md\n    \
                  deep-researcher config --validate                     # Check the configuration"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "researcher.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log line format (overrides [logging] format)
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Compact,
    Json,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and write the report
    Run {
        /// Main topic of the report
        #[arg(short, long)]
        topic: String,

        /// Outline of the report
        #[arg(short, long, conflicts_with = "outline_file", required_unless_present = "outline_file")]
        outline: Option<String>,

        /// Read the outline from a file
        #[arg(long)]
        outline_file: Option<PathBuf>,

        /// Write the report to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the full run output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file and report warnings
        #[arg(long)]
        validate: bool,
    },

    /// Create a researcher.toml to start from
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// LLM provider to configure (ollama or openai)
        #[arg(long, default_value = "ollama")]
        provider: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "deep-researcher",
            "run",
            "--topic",
            "Fusion power",
            "--outline",
            "History, tokamaks",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                topic,
                outline,
                outline_file,
                json,
                ..
            } => {
                assert_eq!(topic, "Fusion power");
                assert_eq!(outline.as_deref(), Some("History, tokamaks"));
                assert!(outline_file.is_none());
                assert!(json);
            }
            other => panic!("Expected run command, got {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("researcher.toml"));
    }

    #[test]
    fn test_run_requires_an_outline() {
        assert!(Cli::try_parse_from(["deep-researcher", "run", "--topic", "x"]).is_err());
    }

    #[test]
    fn test_outline_sources_conflict() {
        let result = Cli::try_parse_from([
            "deep-researcher",
            "run",
            "-t",
            "x",
            "-o",
            "y",
            "--outline-file",
            "outline.md",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "deep-researcher",
            "config",
            "--validate",
            "--config",
            "custom.toml",
            "--log-format",
            "json",
            "--no-color",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.log_format, Some(LogFormatArg::Json));
        assert!(cli.no_color);
        assert!(matches!(cli.command, Commands::Config { validate: true }));
    }
}
