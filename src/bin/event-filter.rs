//! CLI tool to extract unique user identifiers from a CSV event export.
//!
//! Usage:
//!   event-filter --infile=<events.csv>
//!   event-filter --infile=<events.csv> --outfile=<ids.txt> --maxlen=<n>
//!
//! With `--maxlen`, output is split into `<stem>.<index>.<ext>` files of at
//! most `n` identifiers each.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use csv_event_filter::{
    BatchLimit, DEFAULT_OUTFILE, FORM_SUBMITTED, FilterPredicate, PipelineError, RunConfig, run,
};
use tracing_subscriber::EnvFilter;

/// Filter a CSV export of interaction events down to unique user ids.
#[derive(Parser)]
#[command(name = "event-filter", version)]
struct Cli {
    /// Input CSV file with a header row
    #[arg(long, value_name = "PATH")]
    infile: Option<PathBuf>,

    /// Output file (batch files are named after it)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_OUTFILE)]
    outfile: PathBuf,

    /// Maximum identifiers per output file; zero or absent disables splitting
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    maxlen: Option<i64>,

    /// Dot-separated path of the field to compare
    #[arg(long, default_value = "attributes.interaction.response.0.value")]
    field: String,

    /// Value the field must equal
    #[arg(long, default_value = "Yes")]
    value: String,

    /// Event name a row must carry
    #[arg(long, default_value = FORM_SUBMITTED)]
    event: String,

    /// Log debug output on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn usage() -> ! {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "event-filter".to_string());
    eprintln!("Usage: {program} --infile=<filename>");
    process::exit(PipelineError::Usage.exit_code());
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            e.print().ok();
            process::exit(1);
        }
        Err(e) => e.exit(),
    };

    let Some(infile) = cli.infile else {
        usage();
    };

    init_logging(cli.verbose);

    let config = RunConfig::new(infile)
        .with_output(cli.outfile)
        .with_batch_limit(BatchLimit::from_max_len(cli.maxlen))
        .with_predicate(FilterPredicate::new(&cli.field, cli.value))
        .with_discriminator(cli.event);

    match run(&config) {
        Ok(output) => {
            println!("Processed a total of {} entries", output.summary.total);
            println!(
                "{} unique identifiers matched the filter",
                output.summary.filtered
            );
        }
        Err(PipelineError::Usage) => usage(),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(e.exit_code());
        }
    }
}
