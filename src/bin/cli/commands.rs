//! Command implementations for the CLI tool.

use std::path::{Path, PathBuf};

use tarsplitter::config::parse_size;
use tarsplitter::format::inspect_path;
use tarsplitter::sources::{collect_from_dir, path_list_path, read_path_list, write_path_list};
use tarsplitter::split::STDIN_PATH;
use tarsplitter::archive::fragment_path;
use tarsplitter::{ArchiveOptions, ReadFailurePolicy, SplitOptions, Threshold, create, split_path};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::interrupt::InFlight;
use crate::output::create_formatter;
use crate::progress::{ArchiveProgress, SplitProgress};

/// Configuration for the split command.
pub struct SplitConfig<'a> {
    pub input: &'a Path,
    pub prefix: &'a Path,
    pub parts: Option<u64>,
    pub size: Option<&'a str>,
    pub format: OutputFormat,
    pub quiet: bool,
    pub in_flight: &'a InFlight,
}

/// Where the archive command gets its path list from.
pub enum PathSource {
    /// Walk a directory.
    Dir(PathBuf),
    /// Read a newline-separated list file.
    List(PathBuf),
}

/// Configuration for the archive command.
pub struct ArchiveConfig<'a> {
    pub output: &'a Path,
    pub source: PathSource,
    pub workers: usize,
    pub skip_unreadable: bool,
    pub strip_prefix: Option<&'a Path>,
    pub verify: bool,
    pub format: OutputFormat,
    pub quiet: bool,
    pub in_flight: &'a InFlight,
}

fn fail(e: &tarsplitter::Error) -> ExitCode {
    eprintln!("Error: {}", e);
    error_to_exit_code(e)
}

/// Split command implementation
pub fn split(config: &SplitConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    let part_size = match config.size.map(parse_size).transpose() {
        Ok(size) => size,
        Err(e) => return fail(&e),
    };
    let threshold = match Threshold::from_parts(config.parts, part_size) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let options = SplitOptions::new().threshold(threshold);

    let total = if config.input == Path::new(STDIN_PATH) {
        None
    } else {
        std::fs::metadata(config.input).ok().map(|m| m.len())
    };
    let progress = SplitProgress::new(total, config.quiet, config.in_flight);

    let result = split_path(config.input, config.prefix, &options, &progress);
    config.in_flight.clear();
    progress.finish();

    match result {
        Ok(result) => {
            print!("{}", formatter.format_split_result(&result));
            if config.format == OutputFormat::Human {
                println!("All done");
            }
            ExitCode::Success
        }
        Err(e) => fail(&e),
    }
}

/// Archive command implementation
pub fn archive(config: &ArchiveConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    let mut options = ArchiveOptions::new();
    if config.workers > 0 {
        options = match options.workers(config.workers) {
            Ok(o) => o,
            Err(e) => return fail(&e),
        };
    }
    if config.skip_unreadable {
        options = options.read_failure(ReadFailurePolicy::Skip);
    }

    let paths = match &config.source {
        PathSource::Dir(dir) => {
            let paths = match collect_from_dir(dir) {
                Ok(p) => p,
                Err(e) => return fail(&e),
            };
            if let Err(e) = write_path_list(&paths, path_list_path(config.output)) {
                return fail(&e);
            }
            options = options.strip_prefix(config.strip_prefix.unwrap_or(dir.as_path()));
            paths
        }
        PathSource::List(list) => {
            if let Some(prefix) = config.strip_prefix {
                options = options.strip_prefix(prefix);
            }
            match read_path_list(list) {
                Ok(p) => p,
                Err(e) => return fail(&e),
            }
        }
    };

    let progress = ArchiveProgress::new(paths.len() as u64, config.quiet);
    if !config.quiet {
        progress.set_message(format!("{} workers", options.workers.count()));
    }

    for index in 0..options.workers.count() {
        config.in_flight.register(fragment_path(config.output, index));
    }
    config.in_flight.register(config.output);

    let result = create(&paths, config.output, &options, &progress);
    config.in_flight.clear();
    progress.finish();

    let result = match result {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    print!("{}", formatter.format_archive_result(&result));

    if config.verify {
        match inspect_path(config.output) {
            Ok(layout) => {
                print!("{}", formatter.format_layout(&layout));
                if !layout.has_single_trailer() {
                    return ExitCode::BadArchive;
                }
            }
            Err(e) => return fail(&e),
        }
    }

    if config.format == OutputFormat::Human {
        println!("All done");
    }
    ExitCode::Success
}
