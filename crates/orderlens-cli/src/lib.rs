//! Shared CLI definitions for orderlens.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for `--report`
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human readable summary, formatted like the dashboard cards
    #[default]
    Text,
    /// Machine readable JSON document
    Json,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Command-line arguments for orderlens
#[derive(Clone, Parser, Debug)]
#[command(
    name = "orderlens",
    version,
    about = "E-commerce order analytics dashboard in the terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Path to the pre-joined order dataset (CSV).
    /// Defaults to config [data] path, which defaults to all_data.csv
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// First purchase date to include (YYYY-MM-DD). Defaults to the earliest date in the data
    #[arg(long = "start", value_name = "DATE")]
    pub start: Option<String>,

    /// Last purchase date to include (YYYY-MM-DD). Defaults to the latest date in the data
    #[arg(long = "end", value_name = "DATE")]
    pub end: Option<String>,

    /// Number of categories to show in the revenue ranking (default: 10)
    #[arg(long = "top-n", value_name = "N")]
    pub top_n: Option<usize>,

    /// Print the dashboard figures to stdout and exit instead of starting the UI
    #[arg(long = "report", action)]
    pub report: bool,

    /// Output format used with --report
    #[arg(long = "format", value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Write the category and delivery charts as PNG files into DIR and exit
    #[arg(long = "export-charts", value_name = "DIR")]
    pub export_charts: Option<PathBuf>,

    /// Field delimiter of the dataset: a single ASCII character (';'), `tab`, or a byte value (59)
    #[arg(long = "delimiter", value_name = "CHAR", value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,

    /// strptime format of the timestamp columns (default: %Y-%m-%d %H:%M:%S)
    #[arg(long = "timestamp-format", value_name = "FMT")]
    pub timestamp_format: Option<String>,

    /// Write log output to this file (the UI discards logs otherwise)
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/orderlens/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Accepts `;`, `\t` or `tab`, or a decimal byte value such as `59`.
pub fn parse_delimiter(s: &str) -> Result<u8, String> {
    if s == "tab" || s == "\\t" {
        return Ok(b'\t');
    }
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii() && !c.is_ascii_digit() {
            return Ok(c as u8);
        }
    }
    match s.parse::<u8>() {
        Ok(b) if b.is_ascii() => Ok(b),
        _ => Err(format!(
            "'{s}' is not a delimiter: use a single ASCII character, 'tab', or a byte value 0-127"
        )),
    }
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let placeholder: String = arg
            .get_value_names()
            .map(|names| {
                names
                    .iter()
                    .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let option_str = if arg.is_positional() {
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            if arg.get_action().takes_values() && !placeholder.is_empty() {
                format!("{op} {placeholder}")
            } else {
                op
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
