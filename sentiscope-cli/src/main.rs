use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use sentiscope_core::AnalysisEngine;
use std::io::Read;
use std::io::{self};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliValidationMode {
    None,
    Warn,
    Error,
}

impl From<CliValidationMode> for sentiscope_core::ValidationMode {
    fn from(mode: CliValidationMode) -> Self {
        match mode {
            CliValidationMode::None => sentiscope_core::ValidationMode::None,
            CliValidationMode::Warn => sentiscope_core::ValidationMode::Warn,
            CliValidationMode::Error => sentiscope_core::ValidationMode::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliExportFormat {
    Csv,
    Json,
    Pdf,
}

impl From<CliExportFormat> for sentiscope_core::ExportFormat {
    fn from(format: CliExportFormat) -> Self {
        match format {
            CliExportFormat::Csv => sentiscope_core::ExportFormat::Csv,
            CliExportFormat::Json => sentiscope_core::ExportFormat::Json,
            CliExportFormat::Pdf => sentiscope_core::ExportFormat::Pdf,
        }
    }
}

#[cfg(unix)]
fn increase_fd_limit() -> Result<()> {
    use anyhow::anyhow;

    let mut limits = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };

    unsafe {
        if libc::getrlimit(libc::RLIMIT_NOFILE, &mut limits) != 0 {
            return Err(anyhow!("failed to get file descriptor limit"));
        }

        limits.rlim_cur = if limits.rlim_max == libc::RLIM_INFINITY {
            10240
        } else {
            limits.rlim_max.min(10240)
        };

        if libc::setrlimit(libc::RLIMIT_NOFILE, &limits) != 0 {
            eprintln!("Warning: failed to increase file descriptor limit");
        }
    }

    Ok(())
}

#[cfg(not(unix))]
fn increase_fd_limit() -> Result<()> {
    Ok(())
}

#[derive(Parser)]
#[command(name = "sentiscope")]
#[command(about = "Batch sentiment analysis CLI", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[arg(long, short, global = true, help = "Show verbose debug output")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show configuration and provider information")]
    Info,

    #[command(about = "Classify the sentiment of text lines")]
    Analyze {
        #[arg(long, help = "Text to analyze, one entry per line (reads from stdin if no text or files given)")]
        text: Option<String>,

        #[arg(long = "file", help = "Plain-text file; repeatable, each non-blank line becomes one entry")]
        files: Vec<PathBuf>,

        #[arg(long, value_enum, help = "Export format to write; repeatable")]
        export: Vec<CliExportFormat>,

        #[arg(long, help = "Directory exports are written into")]
        output_dir: Option<PathBuf>,

        #[arg(
            long,
            value_enum,
            default_value = "none",
            help = "Schema validation mode for the response"
        )]
        validate: CliValidationMode,

        #[arg(long, short = 'm', help = "Override max_tokens for this request")]
        max_tokens: Option<u32>,
    },

    #[command(about = "Suggest corrected spellings for a word")]
    Suggest {
        #[arg(help = "Word to look up")]
        word: String,
    },

    #[command(about = "Re-export a previously exported JSON result file")]
    Export {
        #[arg(help = "Path to a sentiment_analysis_results.json file")]
        input: PathBuf,

        #[arg(long, value_enum, help = "Target format")]
        to: CliExportFormat,

        #[arg(long, help = "Directory the export is written into")]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    increase_fd_limit()?;

    let cli = Cli::parse();
    let engine = AnalysisEngine::load("sentiscope")?;

    match cli.command {
        Commands::Analyze {
            text,
            files,
            export,
            output_dir,
            validate,
            max_tokens,
        } => {
            let raw = match (text, files.as_slice()) {
                (Some(text), _) => text,
                (None, []) => {
                    let mut buffer = String::new();
                    io::stdin()
                        .read_to_string(&mut buffer)
                        .context("failed to read from stdin")?;
                    buffer
                }
                (None, _) => sentiscope_core::read_batch_files(&files)?,
            };

            let formats: Vec<sentiscope_core::ExportFormat> =
                export.into_iter().map(Into::into).collect();

            commands::handle_analyze(
                &engine,
                &raw,
                validate.into(),
                max_tokens,
                &formats,
                output_dir.as_deref(),
            )
            .await?;
        }
        Commands::Suggest { word } => {
            let candidates = engine.suggest(&word).await?;
            if candidates.is_empty() {
                if cli.verbose {
                    eprintln!("No suggestions for '{word}'.");
                }
            } else {
                for candidate in candidates {
                    println!("{candidate}");
                }
            }
        }
        Commands::Export {
            input,
            to,
            output_dir,
        } => {
            commands::handle_export(&engine, &input, to.into(), output_dir.as_deref())?;
        }
        Commands::Info => {
            commands::handle_info(&engine)?;
        }
    }

    Ok(())
}
