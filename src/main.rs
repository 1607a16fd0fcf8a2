use clap::Parser;
use lhconvert::pipeline::DEFAULT_VARIABLE;
use lhconvert::{ConvertError, ConvertOptions, OutputFormat, Zone, convert};
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lhconvert",
    version,
    about = "Convert a location history JSON export to KML, GPX, CSV or JSON"
)]
struct Cli {
    /// Input file (JSON)
    input: PathBuf,

    /// Output file (will be overwritten!), defaults to the input with the format as extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Format of the output
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Kml)]
    format: OutputFormat,

    /// Variable name to be used for js output
    #[arg(short, long, default_value = DEFAULT_VARIABLE)]
    variable: String,

    /// Start of output data, yyyy/mm/dd
    #[arg(short = 's', long = "startdate")]
    start_date: Option<String>,

    /// End of output data, yyyy/mm/dd
    #[arg(short = 'e', long = "enddate")]
    end_date: Option<String>,

    /// Use UTC instead of local time for the date range and CSV timestamps
    #[arg(long)]
    utc: bool,

    /// Log debug details
    #[arg(long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl From<Cli> for ConvertOptions {
    fn from(cli: Cli) -> Self {
        ConvertOptions {
            input: cli.input,
            output: cli.output,
            format: cli.format,
            variable: cli.variable,
            start_date: cli.start_date,
            end_date: cli.end_date,
            zone: if cli.utc { Zone::utc() } else { Zone::Local },
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), ConvertError> {
    let options = ConvertOptions::from(cli);
    debug!(?options, "Starting conversion");
    let summary = convert(&options)?;

    info!(
        format = %options.format,
        written = summary.records_written,
        skipped = summary.records_read - summary.records_written,
        tracks = summary.tracks,
        "Wrote {}",
        summary.output.display()
    );
    Ok(())
}
