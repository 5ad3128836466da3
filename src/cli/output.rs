//! Colored output helpers for CLI
//!
//! Status lines go to stderr so stdout carries only the report.

use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the name and version
    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            eprintln!(
                "\n  {} {}\n",
                "deep-researcher".bright_cyan().bold(),
                version.dimmed()
            );
        } else {
            eprintln!("\n  deep-researcher {}\n", version);
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✓".green().bold(), message.green());
        } else {
            eprintln!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "•".blue(), message);
        } else {
            eprintln!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            eprintln!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a file creation message
    pub fn created(&self, file_type: &str, path: &str) {
        if self.colored {
            eprintln!(
                "  {} {} {}",
                "✓".green().bold(),
                file_type.dimmed(),
                path.bright_white()
            );
        } else {
            eprintln!("  [CREATED] {} {}", file_type, path);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            eprintln!("\n  {}", title.bright_white().bold().underline());
        } else {
            eprintln!("\n  === {} ===", title);
        }
    }

    /// Print a subheader
    pub fn subheader(&self, title: &str) {
        if self.colored {
            eprintln!("\n  {}", title.cyan().bold());
        } else {
            eprintln!("\n  --- {} ---", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            eprintln!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            eprintln!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            eprintln!("    {} {}", "•".blue(), item);
        } else {
            eprintln!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            eprintln!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            eprintln!("\n  [TIP] {}", message);
        }
    }

    /// Print a command suggestion
    pub fn command(&self, cmd: &str) {
        if self.colored {
            eprintln!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            eprintln!("     $ {}", cmd);
        }
    }

    /// Print completion message
    pub fn complete(&self, message: &str) {
        if self.colored {
            eprintln!("\n  {} {}", "🚀".green(), message.bright_green().bold());
        } else {
            eprintln!("\n  [DONE] {}", message);
        }
    }

    /// Print newline
    pub fn newline(&self) {
        eprintln!();
    }
}
