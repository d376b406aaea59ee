//! Command implementations for recdiff CLI

use crate::cli::{Commands, CompareArgs, ConfigCommand, SourceArgs, TrackArgs};
use crate::loader::{load_table, LoadOptions};
use crate::output::{format_summary, JsonFormatter, MarkdownFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use recdiff_core::config::{self, Config, IdentityConfig, ModeSetting, OutputFormat};
use recdiff_core::{DiffEngine, DiffResult, KeySpec, MatchMode, SnapshotPair};
use std::fs;
use std::path::Path;

/// Exit status when the sources differ
pub const EXIT_CHANGES: i32 = 1;
/// Exit status when nothing changed
pub const EXIT_CLEAN: i32 = 0;

/// Execute a command and return the process exit status
pub fn execute_command(command: Commands, config_path: Option<&Path>) -> Result<i32> {
    match command {
        Commands::Compare(args) => compare_command(args, config_path),
        Commands::Track(args) => track_command(args, config_path),
        Commands::Config { command } => match command {
            ConfigCommand::Show => config_show_command(config_path),
            ConfigCommand::Init { force } => config_init_command(force),
        },
    }
}

/// Changes found means any of the three sequences is non-empty
pub fn has_changes(result: &DiffResult) -> bool {
    !(result.added().is_empty() && result.removed().is_empty() && result.modified().is_empty())
}

fn compare_command(args: CompareArgs, config_path: Option<&Path>) -> Result<i32> {
    let mut config = config::get_config(config_path)?;
    apply_compare_args(&mut config, &args);
    run_comparison(&config, &args.sources, false)
}

fn track_command(args: TrackArgs, config_path: Option<&Path>) -> Result<i32> {
    let mut config = config::get_config(config_path)?;
    apply_track_args(&mut config, &args);
    run_comparison(&config, &args.sources, true)
}

/// Fold command-line flags into the resolved file configuration
pub fn apply_compare_args(config: &mut Config, args: &CompareArgs) {
    apply_source_args(config, &args.sources);
    let comparison = &mut config.comparison;

    if let Some(keys) = &args.key {
        comparison.key_columns = keys.iter().map(|k| k.trim().to_string()).collect();
        comparison.identity = None;
        comparison.mode = None;
    }
    if let Some(primary) = &args.identity {
        comparison.identity = Some(IdentityConfig {
            primary: primary.clone(),
            secondary: args.identity_secondary.clone(),
        });
        comparison.key_columns.clear();
        comparison.mode = None;
    }
    if args.ordered {
        comparison.mode = Some(ModeSetting::Positional);
    }
    if let Some(columns) = &args.columns {
        comparison.columns = columns.iter().map(|c| c.trim().to_string()).collect();
    }
    if args.include_raw_diff {
        comparison.include_raw_diff = true;
    }
}

/// Tracking is always identity-keyed and tolerant
pub fn apply_track_args(config: &mut Config, args: &TrackArgs) {
    apply_source_args(config, &args.sources);
    let comparison = &mut config.comparison;

    comparison.mode = Some(ModeSetting::Keyed);
    comparison.key_columns.clear();
    comparison.identity = Some(IdentityConfig {
        primary: args.identity.clone(),
        secondary: args.identity_secondary.clone(),
    });
    comparison.tolerant = true;
    comparison.include_raw_diff = false;
    if let Some(fields) = &args.fields {
        comparison.columns = fields.iter().map(|f| f.trim().to_string()).collect();
    }
}

fn apply_source_args(config: &mut Config, sources: &SourceArgs) {
    if let Some(format) = sources.format {
        config.output.format = format.into();
    }
    if let Some(max_rows) = sources.max_print_rows {
        config.output.max_print_rows = max_rows;
    }
    if sources.tolerant {
        config.comparison.tolerant = true;
    }
}

fn delimiter_byte(delimiter: Option<char>) -> Result<Option<u8>> {
    delimiter
        .map(|c| {
            u8::try_from(c)
                .ok()
                .filter(u8::is_ascii)
                .ok_or_else(|| anyhow!("Delimiter must be a single ASCII character, got '{c}'"))
        })
        .transpose()
}

fn run_comparison(config: &Config, sources: &SourceArgs, tracking: bool) -> Result<i32> {
    let options = config.comparison_options()?;
    let format = config.output.format;
    let delimiter = delimiter_byte(sources.delimiter)?;

    let mut progress = ProgressReporter::new(
        !sources.quiet && matches!(format, OutputFormat::Text | OutputFormat::Markdown),
    );

    let load = |path: &Path, encoding: Option<&str>| {
        load_table(
            path,
            &LoadOptions {
                encoding: encoding.map(str::to_string),
                delimiter,
                keep_text: options.include_raw_diff,
            },
        )
    };
    progress.set_phase(&format!("Loading {}...", sources.old.display()));
    let old = load(&sources.old, sources.encoding1.as_deref())?;
    progress.set_phase(&format!("Loading {}...", sources.new.display()));
    let new = load(&sources.new, sources.encoding2.as_deref())?;

    progress.set_phase("Comparing...");
    let pair = SnapshotPair::new(old, new);
    let result = DiffEngine::compare(&pair, &options)?;
    progress.finish(&format!(
        "Compared {} and {} records",
        pair.old_snapshot().len(),
        pair.new_snapshot().len()
    ));

    let generated = Utc::now();
    let rendered = match format {
        OutputFormat::Text if tracking => {
            let identity = match &options.mode {
                MatchMode::Keyed(KeySpec::Identity(resolver)) => Some(resolver),
                _ => None,
            };
            PrettyPrinter::format_tracking_report(&pair, &result, identity, generated)
        }
        OutputFormat::Text => PrettyPrinter::format_diff(&pair, &result, config.output.max_print_rows),
        OutputFormat::Markdown => MarkdownFormatter::format(&result, config.output.max_print_rows),
        OutputFormat::Json => JsonFormatter::format(&pair, &result, generated)?,
        OutputFormat::Summary => format_summary(&result),
    };
    write_output(&sources.output, &rendered)?;

    Ok(if has_changes(&result) {
        EXIT_CHANGES
    } else {
        EXIT_CLEAN
    })
}

fn write_output(target: &str, rendered: &str) -> Result<()> {
    if target == "-" {
        println!("{rendered}");
        return Ok(());
    }

    let path = Path::new(target);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, format!("{rendered}\n"))
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    log::info!("Report saved to {}", path.display());
    Ok(())
}

fn config_show_command(config_path: Option<&Path>) -> Result<i32> {
    let config = config::get_config(config_path)?;
    println!("{}", config.to_toml()?);
    Ok(EXIT_CLEAN)
}

fn config_init_command(force: bool) -> Result<i32> {
    let path = config::global_config_path();
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists; use --force to overwrite",
            path.display()
        ));
    }
    let path = config::save_config(&Config::default())?;
    println!("✅ Wrote default configuration to {}", path.display());
    Ok(EXIT_CLEAN)
}
