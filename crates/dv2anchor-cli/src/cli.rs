//! Command-line interface for the dv2anchor utility
//!
//! Converts a Data Vault draw.io diagram into an Anchor model diagram, or
//! only checks it with `--check`.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use dv2anchor::core::logging::init_logging;
use dv2anchor::{ConvertConfig, Pipeline};

/// dv2anchor - Convert Data Vault draw.io diagrams into Anchor model diagrams
#[derive(Parser)]
#[command(name = "dv2anchor")]
#[command(about = "A Rust utility to convert Data Vault draw.io diagrams into Anchor model diagrams")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    /// draw.io file holding the Data Vault model (use - for stdin)
    #[arg(required_unless_present = "print_config")]
    pub input: Option<PathBuf>,

    /// Output file (default: <input dir>/<input stem>_anchor.xml, use - for stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only extract and validate the model, write nothing
    #[arg(long)]
    pub check: bool,

    /// Zero-based index of the diagram page to convert
    #[arg(long)]
    pub page: Option<usize>,

    /// JSON configuration file; missing fields keep their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// When to use colors in diagnostics
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// When to colorize diagnostics
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Use colors if stderr is a terminal and NO_COLOR is not set
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Main CLI application
#[derive(Default)]
pub struct Dv2AnchorApp;

impl Dv2AnchorApp {
    pub fn new() -> Self {
        Self
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        // Flags win over DV2ANCHOR_LOG_LEVEL / RUST_LOG, which win over the default
        if let Err(e) = init_logging(
            cli.log_level.map(|l| l.as_str()),
            cli.log_format.map(|f| f.as_str()),
        ) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("dv2anchor v{}", env!("CARGO_PKG_VERSION"));
        }

        let config = self.load_config(cli.config.as_deref(), cli.page)?;
        if cli.print_config {
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }

        let input = cli
            .input
            .ok_or_else(|| anyhow!("No input file given"))?;
        let content = self.read_input(&input)?;
        if cli.verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let pipeline = Pipeline::with_config(config);
        if cli.check {
            return self.check_command(&pipeline, &input, &content);
        }

        let xml = pipeline
            .process(&content)
            .with_context(|| format!("Failed to convert '{}'", input.display()))?;

        let output = cli.output.unwrap_or_else(|| default_output_path(&input));
        self.write_output(&output, &xml)?;
        info!(output = %output.display(), bytes = xml.len(), "Wrote anchor model");
        if cli.verbose {
            eprintln!("Wrote {}", output.display());
        }
        Ok(())
    }

    fn check_command(&self, pipeline: &Pipeline, input: &Path, content: &str) -> Result<()> {
        let vault = pipeline
            .check(content)
            .with_context(|| format!("Failed to check '{}'", input.display()))?;
        println!(
            "✓ Valid Data Vault model: {} hub(s), {} link(s), {} satellite(s)",
            vault.hub_count(),
            vault.link_count(),
            vault.satellite_count()
        );
        Ok(())
    }

    /// Defaults, overlaid with the config file, overlaid with `--page`
    pub fn load_config(&self, path: Option<&Path>, page: Option<usize>) -> Result<ConvertConfig> {
        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid config file '{}'", path.display()))?
            }
            None => ConvertConfig::default(),
        };
        if let Some(page) = page {
            config.page = page;
        }
        Ok(config)
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: &Path) -> Result<String> {
        if input.to_string_lossy() == "-" {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            Ok(content)
        } else {
            fs::read_to_string(input)
                .with_context(|| format!("Failed to read input file '{}'", input.display()))
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: &Path, content: &str) -> Result<()> {
        if output.to_string_lossy() == "-" {
            let mut stdout = io::stdout();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        } else {
            fs::write(output, content)
                .with_context(|| format!("Failed to write output file '{}'", output.display()))?;
        }
        Ok(())
    }
}

/// `<input dir>/<input stem>_anchor.xml`, or stdout when reading stdin
pub fn default_output_path(input: &Path) -> PathBuf {
    if input.to_string_lossy() == "-" {
        return PathBuf::from("-");
    }
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "diagram".to_string());
    input.with_file_name(format!("{}_anchor.xml", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parsing_defaults() {
        let cli = Cli::try_parse_from(["dv2anchor", "model.drawio"]).unwrap();
        assert_eq!(cli.input.unwrap().to_string_lossy(), "model.drawio");
        assert!(cli.output.is_none());
        assert!(!cli.check);
        assert!(cli.page.is_none());
        assert_eq!(cli.color, ColorChoice::Auto);
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_cli_parsing_all_flags() {
        let cli = Cli::try_parse_from([
            "dv2anchor",
            "model.drawio",
            "-o",
            "out.xml",
            "--check",
            "--page",
            "2",
            "--config",
            "settings.json",
            "--color",
            "never",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.output.unwrap().to_string_lossy(), "out.xml");
        assert!(cli.check);
        assert_eq!(cli.page, Some(2));
        assert_eq!(cli.config.unwrap().to_string_lossy(), "settings.json");
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(cli.verbose);
    }

    #[test]
    fn test_input_required_unless_print_config() {
        assert!(Cli::try_parse_from(["dv2anchor"]).is_err());
        let cli = Cli::try_parse_from(["dv2anchor", "--print-config"]).unwrap();
        assert!(cli.print_config);
        assert!(cli.input.is_none());
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("models/sales.drawio")),
            PathBuf::from("models/sales_anchor.xml")
        );
        assert_eq!(
            default_output_path(Path::new("sales.xml")),
            PathBuf::from("sales_anchor.xml")
        );
        assert_eq!(default_output_path(Path::new("-")), PathBuf::from("-"));
    }

    #[test]
    fn test_load_config_overlays() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "page": 1, "layout": { "row_height": 24 } }"#).unwrap();

        let app = Dv2AnchorApp::new();
        let config = app.load_config(Some(&path), None).unwrap();
        assert_eq!(config.page, 1);
        assert_eq!(config.layout.row_height, 24.0);

        let config = app.load_config(Some(&path), Some(0)).unwrap();
        assert_eq!(config.page, 0);
    }

    #[test]
    fn test_load_config_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let error = Dv2AnchorApp::new().load_config(Some(&path), None).unwrap_err();
        assert!(error.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_read_and_write_files() {
        let app = Dv2AnchorApp::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xml");

        app.write_output(&path, "<mxfile/>").unwrap();
        assert_eq!(app.read_input(&path).unwrap(), "<mxfile/>");
    }

    #[test]
    fn test_read_missing_file() {
        let error = Dv2AnchorApp::new()
            .read_input(Path::new("/nonexistent/model.drawio"))
            .unwrap_err();
        assert!(error.to_string().contains("Failed to read input file"));
    }
}
