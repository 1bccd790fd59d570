//! Datalogger Log CLI Application
//!
//! This is the command-line interface for the datalogger log decoder.
//! It uses the dla-decoder library and adds:
//! - Input and schema file selection (flags or config.toml)
//! - Text dump and packed row output
//! - Per-file summaries

use anyhow::{Context, Result};
use clap::Parser;
use dla_decoder::Decoder;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::{FileSummary, ReportWriter};

/// Datalogger Log Decoder - Decode datalogger ASCII logs
#[derive(Parser, Debug)]
#[command(name = "dla-cli")]
#[command(about = "Decode datalogger ASCII log files (.dla)", long_about = None)]
#[command(version)]
struct Args {
    /// Path to .dla log file(s) to decode (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    log: Vec<PathBuf>,

    /// Path to JSON CAN schema file(s), highest precedence first (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    schema: Vec<PathBuf>,

    /// Output file for decoded messages (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of lines to decode per file (for testing)
    #[arg(long, value_name = "COUNT")]
    max_lines: Option<usize>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Datalogger Log CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", dla_decoder::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    // Command-line files come after configured ones
    config.input.files.extend(args.log.iter().cloned());
    config.input.schema_files.extend(args.schema.iter().cloned());
    if let Some(format) = args.format {
        config.output.format = format;
    }

    if config.input.files.is_empty() {
        println!("Datalogger Log Decoder - No input specified");
        println!("\nQuick Start:");
        println!("  dla-cli --log RUN0001.DLA --schema CFG/tritium.can.json");
        println!("  dla-cli --log RUN0001.DLA --schema CFG/batteries.can.json --format packed");
        println!("\nWith a configuration file:");
        println!("  dla-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    run(&config, args.output.as_deref(), args.max_lines)
}

/// Load schemas, then decode every input file in turn
fn run(config: &AppConfig, output: Option<&Path>, max_lines: Option<usize>) -> Result<()> {
    let mut decoder = Decoder::with_config(config.decoder.clone());

    for schema_path in &config.input.schema_files {
        decoder
            .add_schema_file(schema_path)
            .with_context(|| format!("Failed to load schema file: {:?}", schema_path))?;
    }

    let stats = decoder.schema_stats();
    log::info!(
        "Schema tables: {} ({} entries)",
        stats.num_tables,
        stats.num_entries
    );

    // A single --output file collects every input; otherwise one file per input
    let mut shared: Option<ReportWriter<Box<dyn Write>>> = match output {
        Some(path) => Some(ReportWriter::new(create_output(path)?, config.output.format)),
        None => None,
    };

    for log_path in &config.input.files {
        let summary = match shared.as_mut() {
            Some(writer) => decode_one(&mut decoder, log_path, writer, max_lines)?,
            None => {
                let out: Box<dyn Write> = match &config.output.output_dir {
                    Some(dir) => create_output(&output_path(dir, log_path, config.output.format))?,
                    None => Box::new(BufWriter::new(io::stdout().lock())),
                };
                let mut writer = ReportWriter::new(out, config.output.format);
                let summary = decode_one(&mut decoder, log_path, &mut writer, max_lines)?;
                writer.finish()?;
                summary
            }
        };
        summary.log(log_path);
    }

    if let Some(writer) = shared {
        writer.finish()?;
    }

    Ok(())
}

/// Decode one log file into `writer`
///
/// Line errors are logged and counted; they never stop the file.
fn decode_one<W: Write>(
    decoder: &mut Decoder,
    log_path: &Path,
    writer: &mut ReportWriter<W>,
    max_lines: Option<usize>,
) -> Result<FileSummary> {
    let mut summary = FileSummary::default();
    writer.write_preamble(log_path)?;

    let mut messages = decoder
        .decode_file(log_path)
        .with_context(|| format!("Failed to open log file: {:?}", log_path))?;

    while let Some(result) = messages.next() {
        if max_lines.is_some_and(|max| messages.lines_read() > max) {
            log::info!("Stopping after {} lines", messages.lines_read() - 1);
            break;
        }
        match result {
            Ok(message) => writer.write_message(&message, &mut summary)?,
            Err(e) => {
                log::error!("{:?}: {}", log_path, e);
                summary.errors += 1;
            }
        }
    }

    summary.lines_read = messages.lines_read();
    Ok(summary)
}

/// `<dir>/<stem><suffix>`, e.g. `out/RUN0001rawdata.txt`
fn output_path(dir: &Path, log_path: &Path, format: OutputFormat) -> PathBuf {
    let stem = log_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("log");
    dir.join(format!("{}{}", stem, format.file_suffix()))
}

fn create_output(path: &Path) -> Result<Box<dyn Write>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    log::info!("Writing output to {:?}", path);
    Ok(Box::new(BufWriter::new(file)))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
