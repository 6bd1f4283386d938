//! CLI tool for tarsplitter operations.

mod commands;
mod exit_codes;
mod interrupt;
mod output;
mod progress;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;
use interrupt::InFlight;

/// Split large tar archives, or build one in parallel
#[derive(Parser)]
#[command(name = "tarsplitter")]
#[command(author, version, about = "Split large tar archives, or build one in parallel", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Log each part and fragment (sets RUST_LOG=info unless already set)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split one tar archive into several (alias: s)
    #[command(alias = "s")]
    Split {
        /// Archive to split, or - for standard input
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Prefix of the part files; parts are named <prefix><N>.tar
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Number of parts to aim for (default 4)
        #[arg(short = 'p', long, conflicts_with = "size")]
        parts: Option<u64>,

        /// Maximum part size, e.g. 500MB or 2GiB
        #[arg(short = 's', long)]
        size: Option<String>,
    },

    /// Build one tar archive from many files with parallel workers (alias: a)
    #[command(alias = "a")]
    Archive {
        /// Archive file to create
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Directory to archive; the walked path list is saved as <output>.txt
        #[arg(short = 'd', long, conflicts_with = "list", required_unless_present = "list")]
        dir: Option<PathBuf>,

        /// File containing one path per line
        #[arg(short = 'l', long)]
        list: Option<PathBuf>,

        /// Number of workers (0 = one per CPU)
        #[arg(short = 'w', long, default_value = "0", env = "TARSPLITTER_WORKERS")]
        workers: usize,

        /// Skip files that cannot be opened instead of failing
        #[arg(long)]
        skip_unreadable: bool,

        /// Prefix removed from entry names (defaults to --dir)
        #[arg(long)]
        strip_prefix: Option<PathBuf>,

        /// Check the structure of the finished archive
        #[arg(long)]
        verify: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    // Set up Ctrl+C handler; unfinished parts, fragments and outputs are removed
    let in_flight = InFlight::new();
    let handler_in_flight = in_flight.clone();
    ctrlc::set_handler(move || {
        let removed = handler_in_flight.remove_all();
        if removed > 0 {
            eprintln!("\nInterrupted, removed {} unfinished files", removed);
        } else {
            eprintln!("\nInterrupted");
        }
        std::process::exit(exit_codes::USER_INTERRUPT);
    })
    .ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Split {
            input,
            output,
            parts,
            size,
        } => commands::split(&commands::SplitConfig {
            input: &input,
            prefix: &output,
            parts,
            size: size.as_deref(),
            format: cli.format,
            quiet: cli.quiet,
            in_flight: &in_flight,
        }),

        Commands::Archive {
            output,
            dir,
            list,
            workers,
            skip_unreadable,
            strip_prefix,
            verify,
        } => {
            let source = match (dir, list) {
                (Some(dir), _) => commands::PathSource::Dir(dir),
                (None, Some(list)) => commands::PathSource::List(list),
                (None, None) => {
                    eprintln!("Error: one of --dir or --list is required");
                    std::process::exit(exit_codes::BAD_ARGS);
                }
            };
            commands::archive(&commands::ArchiveConfig {
                output: &output,
                source,
                workers,
                skip_unreadable,
                strip_prefix: strip_prefix.as_deref(),
                verify,
                format: cli.format,
                quiet: cli.quiet,
                in_flight: &in_flight,
            })
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
