//! Command-line interface for lostfield.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{self, Config, NonSerializableHandling, OutputFormat, DEFAULT_CONFIG_TEMPLATE};
use crate::detect::{collect_files, DetectionResult, Runner};
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Find fields silently dropped by converter functions.
///
/// Lostfield looks for Go functions that convert one struct into another
/// (domain model to DTO, DTO to wire type, ...) and reports every source
/// field that is never read and every destination field that is never set.
#[derive(Parser)]
#[command(name = "lostfield")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log progress (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check converters for unmapped fields
    #[command(visible_alias = "lint")]
    Check(CheckArgs),
    /// Write a commented default configuration file
    Init(InitArgs),
}

/// Arguments for the check command.
#[derive(Parser, Debug, Default)]
pub struct CheckArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: default, pretty, or json
    #[arg(short, long)]
    pub format: Option<String>,

    /// Show suppressed findings in pretty output
    #[arg(long)]
    pub show_suppressed: bool,

    /// Only check plain functions, not methods
    #[arg(long)]
    pub no_member_functions: bool,

    /// Do not accept GetField() calls as reading Field
    #[arg(long)]
    pub no_getter_fallback: bool,

    /// Allow slice-to-struct converters
    #[arg(long)]
    pub allow_aggregating: bool,

    /// Field name pattern to ignore (repeatable)
    #[arg(long = "exclude-field", value_name = "PATTERN")]
    pub exclude_fields: Vec<String>,

    /// Function name pattern never treated as a converter (repeatable)
    #[arg(long = "exclude-converter", value_name = "PATTERN")]
    pub exclude_converters: Vec<String>,

    /// File pattern to skip (repeatable)
    #[arg(long = "exclude-file", value_name = "PATTERN")]
    pub exclude_files: Vec<String>,

    /// Minimum name similarity, 0.0 - 1.0
    #[arg(long, value_name = "RATIO")]
    pub min_similarity: Option<f64>,

    /// Struct tag (entry or key) marking fields to ignore (repeatable)
    #[arg(long = "ignore-tag", value_name = "TAG")]
    pub ignore_tags: Vec<String>,

    /// Check generated files too
    #[arg(long)]
    pub include_generated: bool,

    /// Skip fields marked Deprecated
    #[arg(long)]
    pub ignore_deprecated: bool,

    /// Check unexported fields too
    #[arg(long)]
    pub include_private: bool,

    /// Func/chan field handling: ignore, adaptive, or strict
    #[arg(long, value_name = "MODE")]
    pub non_serializable: Option<String>,
}

impl CheckArgs {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if self.no_member_functions {
            config.include_member_functions = false;
        }
        if self.no_getter_fallback {
            config.allow_getter_fallback = false;
        }
        if self.allow_aggregating {
            config.allow_aggregating_converters = true;
        }
        if self.include_generated {
            config.include_generated_files = true;
        }
        if self.ignore_deprecated {
            config.ignore_deprecated_fields = true;
        }
        if self.include_private {
            config.include_private_fields = true;
        }

        config.exclude_field_patterns.extend(self.exclude_fields.iter().cloned());
        config
            .exclude_converter_patterns
            .extend(self.exclude_converters.iter().cloned());
        config.exclude_file_patterns.extend(self.exclude_files.iter().cloned());
        config.ignore_field_tags.extend(self.ignore_tags.iter().cloned());

        if let Some(ratio) = self.min_similarity {
            config.min_name_similarity = ratio;
        }
        if let Some(mode) = &self.non_serializable {
            config.non_serializable_fields = mode
                .parse::<NonSerializableHandling>()
                .map_err(anyhow::Error::msg)?;
        }
        if let Some(format) = &self.format {
            config.output_format = format.parse::<OutputFormat>().map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "lostfield.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Render `result` in the configured format to stdout.
fn write_report(args: &CheckArgs, root: &Path, format: OutputFormat, result: &DetectionResult) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => report::write_json(&mut out, &args.path.to_string_lossy(), result)?,
        OutputFormat::Pretty => report::write_pretty(&mut out, root, result, args.show_suppressed)?,
        OutputFormat::Default => report::write_default(&mut out, result)?,
    }
    out.flush()?;
    Ok(())
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    let working_dir = std::env::current_dir()?;

    let (mut config, config_path) = match Config::load(args.config.as_deref(), &working_dir) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if let Err(e) = args.apply(&mut config) {
        eprintln!("Error: {}", e);
        return Ok(EXIT_ERROR);
    }
    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }
    if let Some(p) = &config_path {
        tracing::info!(path = %p.display(), "using config");
    }

    // Resolve path
    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let (root, files) = if abs_path.is_dir() {
        let files = collect_files(&abs_path, &config)?;
        (abs_path, files)
    } else {
        let root = abs_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| abs_path.clone());
        (root, vec![abs_path])
    };

    if files.is_empty() {
        eprintln!("Warning: no Go files to check");
        return Ok(EXIT_SUCCESS);
    }
    tracing::info!(files = files.len(), root = %root.display(), "checking converters");

    let result = Runner::new(&root).run(&files, &config)?;
    write_report(args, &root, config.output_format, &result)?;

    if result.has_findings() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it, pass --force, or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: lostfield check . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}
