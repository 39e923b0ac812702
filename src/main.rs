//! cornzip - Compress, extract and convert archives.
//!
//! Usage:
//!   cornzip compress FILES... --name NAME   Pack files into one archive
//!   cornzip extract ARCHIVES...             Unpack archives
//!   cornzip convert ARCHIVES... --to FMT    Re-encode archives
//!   cornzip classify NAMES...               Detect archive formats
//!   cornzip estimate FILES...               Estimate compressed size
//!   cornzip formats                         List supported formats
//!   cornzip --help                          Show help

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use cornzip_core::{
    ArchiveFormat, CompressionLevel, CompressionMethod, CompressionOptions, ConversionOptions,
    ExtractionMode, ExtractionOptions, InputFileRef, PipelineConfig, SplitSize, SplitUnit,
    classify, estimate, is_archive, ratio, total_size,
};
use cornzip_ops::{
    Action, FsActionHandler, OperationExecutor, OperationHandle, OperationKind, OperationResult,
    SimulatedEngine, SimulationConfig,
};

#[derive(Parser)]
#[command(
    name = "cornzip",
    version,
    about = "Compress, extract and convert archives",
    long_about = "cornzip runs archive operations through an async pipeline with live \
                  progress.\n\nThe bundled engine simulates the byte-level work, so \
                  results are estimates and written artifacts are placeholders."
)]
struct Cli {
    /// Pipeline configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Skip the simulated engine's pacing
    #[arg(long, global = true)]
    instant: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pack files into one archive
    Compress {
        /// Files to compress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Archive name (the format extension is added when missing)
        #[arg(short, long, default_value = "archive")]
        name: String,

        /// Archive format
        #[arg(long = "type", default_value = "zip")]
        archive_format: ArchiveFormat,

        /// Compression level (0-9)
        #[arg(short, long, default_value = "5")]
        level: u8,

        /// Compression method (fast, standard, maximum, ultra)
        #[arg(short, long, default_value = "standard")]
        method: CompressionMethod,

        /// Encrypt with this password
        #[arg(short, long)]
        password: Option<String>,

        /// Split into volumes of this size
        #[arg(long)]
        split: Option<u64>,

        /// Unit of --split (kb, mb, gb)
        #[arg(long, default_value = "mb")]
        split_unit: SplitUnit,

        /// Directory the archive is saved into
        #[arg(short, long, default_value = "Downloads")]
        output: PathBuf,

        /// Save the archive into the output directory
        #[arg(long)]
        save: bool,

        /// Export the archive into this directory
        #[arg(long)]
        export: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Unpack archives
    Extract {
        /// Archives to extract (non-archives are skipped)
        #[arg(required = true)]
        archives: Vec<PathBuf>,

        /// Destination directory
        #[arg(short, long)]
        to: Option<PathBuf>,

        /// Extraction mode (folder, current, custom, selective)
        #[arg(short, long, default_value = "folder")]
        mode: ExtractionMode,

        /// Member to extract in selective mode (repeatable)
        #[arg(short, long = "select")]
        selected: Vec<String>,

        /// Archive password
        #[arg(short, long)]
        password: Option<String>,

        /// Overwrite existing files
        #[arg(long)]
        overwrite: bool,

        /// Drop the archive's folder structure
        #[arg(long)]
        flatten: bool,

        /// Print the extraction log
        #[arg(long)]
        log: bool,

        /// Check that the destination exists afterwards
        #[arg(long)]
        reveal: bool,

        /// Export the extracted files into this directory
        #[arg(long)]
        export: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Re-encode archives in another format
    Convert {
        /// Archives to convert (non-archives are skipped)
        #[arg(required = true)]
        archives: Vec<PathBuf>,

        /// Target format
        #[arg(long)]
        to: String,

        /// Source format (detected per file when omitted)
        #[arg(long, default_value = "")]
        from: String,

        /// Export the converted archives into this directory
        #[arg(long)]
        export: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Detect the archive format of file names
    Classify {
        /// File names to classify
        #[arg(required = true)]
        names: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Estimate the compressed size of files
    Estimate {
        /// Files to measure
        files: Vec<PathBuf>,

        /// Use this many bytes instead of measuring files
        #[arg(short, long, conflicts_with = "files")]
        bytes: Option<u64>,

        /// Compression level (0-9)
        #[arg(short, long, default_value = "5")]
        level: u8,

        /// Compression method (fast, standard, maximum, ultra)
        #[arg(short, long, default_value = "standard")]
        method: CompressionMethod,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List supported archive formats
    Formats {
        /// Only formats that can be created
        #[arg(short, long)]
        writable: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let simulation = if cli.instant {
        SimulationConfig::instant()
    } else {
        SimulationConfig::default()
    };
    let executor = OperationExecutor::with_config(SimulatedEngine::new(simulation), config);

    match cli.command {
        Command::Compress {
            files,
            name,
            archive_format,
            level,
            method,
            password,
            split,
            split_unit,
            output,
            save,
            export,
            format,
        } => {
            let mut builder = CompressionOptions::builder();
            builder
                .archive_name(name)
                .format(archive_format)
                .level(level)
                .method(method)
                .output_path(output);
            if let Some(password) = password {
                builder.password(password);
            }
            if let Some(size) = split {
                builder.split(SplitSize::new(size, split_unit));
            }
            let options = builder.build().context("Invalid compression options")?;

            let inputs = read_inputs(&files)?;
            let handle = executor.start_operation(OperationKind::Compression, inputs, options)?;
            let result = follow(&executor, &handle).await?;

            let mut actions = Vec::new();
            if save {
                actions.push(Action::Materialize);
            }
            if export.is_some() {
                actions.push(Action::Export);
            }
            run_actions(&result, &actions, export.as_deref())?;
            print_result(&result, format, false)?;
        }
        Command::Extract {
            archives,
            to,
            mode,
            selected,
            password,
            overwrite,
            flatten,
            log,
            reveal,
            export,
            format,
        } => {
            let mut builder = ExtractionOptions::builder();
            builder
                .mode(mode)
                .overwrite(overwrite)
                .preserve_structure(!flatten);
            if let Some(to) = to {
                builder.extract_path(to);
            }
            if let Some(password) = password {
                builder.password(password);
            }
            if !selected.is_empty() {
                builder.selected_files(selected);
            }
            let options = builder.build().context("Invalid extraction options")?;

            let inputs = read_inputs(&archives)?;
            let handle = executor.start_operation(OperationKind::Extraction, inputs, options)?;
            let result = follow(&executor, &handle).await?;

            let mut actions = Vec::new();
            if reveal {
                actions.push(Action::Reveal);
            }
            if export.is_some() {
                actions.push(Action::Export);
            }
            run_actions(&result, &actions, export.as_deref())?;
            print_result(&result, format, log)?;
        }
        Command::Convert {
            archives,
            to,
            from,
            export,
            format,
        } => {
            let options = ConversionOptions::new(from, to);
            let inputs = read_inputs(&archives)?;
            let handle = executor.start_operation(OperationKind::Conversion, inputs, options)?;
            let result = follow(&executor, &handle).await?;

            let actions: &[Action] = if export.is_some() { &[Action::Export] } else { &[] };
            run_actions(&result, actions, export.as_deref())?;
            print_result(&result, format, false)?;
        }
        Command::Classify { names, format } => run_classify(&names, format)?,
        Command::Estimate {
            files,
            bytes,
            level,
            method,
            format,
        } => {
            let total = match bytes {
                Some(bytes) => bytes,
                None => total_size(&read_inputs(&files)?),
            };
            run_estimate(total, level, method, format)?;
        }
        Command::Formats { writable, format } => run_formats(writable, format)?,
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` overrides `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = PipelineConfig::from_toml(&source)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// Build input references from files on disk.
fn read_inputs(paths: &[PathBuf]) -> Result<Vec<InputFileRef>> {
    paths
        .iter()
        .map(|path| {
            let metadata = std::fs::metadata(path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            Ok(InputFileRef::from_path(path, metadata.len()))
        })
        .collect()
}

/// Show progress on stderr until the run ends, then return its result.
async fn follow(
    executor: &OperationExecutor<SimulatedEngine>,
    handle: &OperationHandle,
) -> Result<OperationResult> {
    let mut subscription = executor.subscribe_progress(handle);
    let mut shown = None;

    while let Some(progress) = subscription.next().await {
        let percent = progress.percent.floor() as u8;
        if shown != Some(percent) {
            let item = progress.detail.current_item.as_deref().unwrap_or("");
            let rate = progress
                .detail
                .bytes_per_second
                .map(|bps| format!("{}/s", format_size(bps)))
                .unwrap_or_default();
            eprint!(
                "\r{:<12} {:>3}% {:>12} {:<40}",
                handle.kind(),
                percent,
                rate,
                truncate(item, 40)
            );
            shown = Some(percent);
        }
    }
    eprintln!();

    Ok(handle.wait().await?)
}

fn run_actions(
    result: &OperationResult,
    actions: &[Action],
    export_dir: Option<&Path>,
) -> Result<()> {
    let handler = FsActionHandler::new(export_dir.unwrap_or(Path::new(".")));

    for capability in result.capabilities() {
        if !actions.contains(&capability.action()) {
            continue;
        }
        capability
            .invoke(&handler)
            .with_context(|| format!("{} failed", capability.action()))?;
        eprintln!("{}: {}", capability.action(), capability.target().display());
    }

    Ok(())
}

fn print_result(result: &OperationResult, format: OutputFormat, show_log: bool) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            println!(" {}", result.summary());
            println!("{}", "─".repeat(60));

            match result {
                OperationResult::Compression(r) => {
                    println!(" Archive:     {}", r.archive_path().display());
                    println!(" Format:      {}", r.format.label());
                    println!(" Original:    {}", format_size(r.original_size));
                    println!(" Compressed:  {}", format_size(r.compressed_size));
                    println!(" Saved:       {}%", r.ratio);
                    if let Some(volumes) = r.volumes {
                        println!(" Volumes:     {}", volumes);
                    }
                }
                OperationResult::Extraction(r) => {
                    println!(" Destination: {}", r.extract_path.display());
                    println!(" Files:       {}", r.file_count);
                    println!(" Total size:  {}", format_size(r.total_size));
                    if !r.skipped.is_empty() {
                        println!(" Skipped:     {}", r.skipped.join(", "));
                    }
                    if show_log {
                        println!();
                        print!("{}", r.log);
                    }
                }
                OperationResult::Conversion(r) => {
                    println!(" Converted:   {}", r.converted_count);
                    println!(" From:        {}", r.source_format);
                    println!(" To:          {}", r.target_format.label());
                    if !r.skipped.is_empty() {
                        println!(" Skipped:     {}", r.skipped.join(", "));
                    }
                }
            }
            println!();
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    }

    Ok(())
}

fn run_classify(names: &[String], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for name in names {
                let label = classify(name)
                    .map(|f| f.label())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<10} {}", label, name);
            }
        }
        OutputFormat::Json => {
            let entries: Vec<_> = names
                .iter()
                .map(|name| {
                    serde_json::json!({
                        "name": name,
                        "format": classify(name),
                        "archive": is_archive(name),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

fn run_estimate(
    total: u64,
    level: u8,
    method: CompressionMethod,
    format: OutputFormat,
) -> Result<()> {
    let level = CompressionLevel::new(level)?;
    let est = estimate(total, level, method);

    match format {
        OutputFormat::Text => {
            println!(" Method:     {} (level {})", method, level.get());
            println!(" Original:   {}", format_size(total));
            println!(" Estimated:  {}", format_size(est.estimated_bytes));
            println!(
                " Saved:      {}% ({})",
                est.saved_percent,
                format_size(est.saved_bytes(total))
            );
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "original_size": total,
                "estimated_size": est.estimated_bytes,
                "saved_percent": est.saved_percent,
                "ratio": ratio(level, method),
                "level": level.get(),
                "method": method,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

fn run_formats(writable_only: bool, format: OutputFormat) -> Result<()> {
    let formats: Vec<ArchiveFormat> = if writable_only {
        ArchiveFormat::writable().collect()
    } else {
        ArchiveFormat::all().collect()
    };

    match format {
        OutputFormat::Text => {
            for f in &formats {
                let mut extensions = vec![f.extension()];
                extensions.extend(f.aliases().iter().map(|alias| alias.to_string()));
                println!(
                    "{:<8} {:<28} {} {}",
                    f.label(),
                    extensions.join(" "),
                    if f.is_writable() { "rw" } else { "r " },
                    f.description()
                );
            }
        }
        OutputFormat::Json => {
            let entries: Vec<_> = formats
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "value": f.value(),
                        "label": f.label(),
                        "extension": f.extension(),
                        "aliases": f.aliases(),
                        "description": f.description(),
                        "writable": f.is_writable(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}
