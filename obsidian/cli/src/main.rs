use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use color_eyre::eyre::{Result, WrapErr};
use obsidian_lib::{FailurePolicy, GeneratorConfig, InputSource, OutputLayout, run};
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "obsidian",
    version,
    about = "Generates C++ reflection headers from annotated enums and classes"
)]
#[command(group = ArgGroup::new("input")
    .args(["input_file", "input_dir"])
    .required(true)
    .multiple(false))]
struct Cli {
    /// Header to process
    #[arg(long, value_name = "FILE")]
    input_file: Option<PathBuf>,

    /// Directory scanned recursively for .h/.hpp headers
    #[arg(long, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Where generated headers are written (created if missing)
    #[arg(short = 'o', long, value_name = "DIR")]
    output_dir: PathBuf,

    /// Print the extracted metadata as JSON to stdout
    #[arg(long)]
    dump: bool,

    /// Write one header per reflected type
    #[arg(long)]
    split: bool,

    /// Keep processing after a header fails to parse
    #[arg(long)]
    keep_going: bool,

    /// Increase verbosity (-v INFO, -vv DEBUG, -vvv TRACE, -vvvv TRACE with file/line)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Compiler flags passed through to the frontend (after `--`)
    #[arg(last = true, value_name = "COMPILE_OPTIONS")]
    compile_options: Vec<String>,
}

impl Cli {
    fn into_config(self) -> GeneratorConfig {
        let input = match (self.input_file, self.input_dir) {
            (Some(file), _) => InputSource::File(file),
            (None, Some(dir)) => InputSource::Directory(dir),
            // The `input` group guarantees one of the two.
            (None, None) => InputSource::Directory(PathBuf::from(".")),
        };

        GeneratorConfig {
            input,
            output_dir: self.output_dir,
            compile_options: self.compile_options,
            dump_metadata: self.dump,
            layout: if self.split {
                OutputLayout::PerType
            } else {
                OutputLayout::SingleHeader
            },
            failure_policy: if self.keep_going {
                FailurePolicy::KeepGoing
            } else {
                FailurePolicy::FailFast
            },
        }
    }
}

/// Initialize tracing subscriber based on verbosity level.
///
/// Verbosity levels:
/// - 0 (default): WARN only
/// - 1 (-v): INFO (per-file progress, written files)
/// - 2 (-vv): DEBUG (extraction and rendering detail)
/// - 3 (-vvv): TRACE
/// - 4+ (-vvvv): TRACE with file/line numbers
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,obsidian=info,obsidian_lib=info".to_string(),
            2 => "info,obsidian=debug,obsidian_lib=debug".to_string(),
            _ => "debug,obsidian=trace,obsidian_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_file(verbose >= 4)
                .with_line_number(verbose >= 4)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.into_config();
    let summary = run(&config).wrap_err("reflection code generation failed")?;

    info!(
        files = summary.files_processed,
        enums = summary.enums,
        classes = summary.classes,
        "done"
    );
    for path in &summary.written {
        info!(path = %path.display(), "written");
    }

    Ok(())
}
