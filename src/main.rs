use std::error::Error;
use std::path;
use std::process;
use std::time::Instant;

use clap::ValueEnum;
use env_logger;
use log;

use large_sort::stage::format_elapsed;
use large_sort::{SortError, SortPipelineBuilder, SortSummary};

const DEFAULT_CHUNK_SIZE_ARG: &str = "1000000";

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let args = SortArgs {
        input: path::Path::new(arg_parser.value_of("input").expect("value is required")),
        output: path::Path::new(arg_parser.value_of("output").expect("value has default")),
        chunk_size: arg_parser.value_of_t_or_exit("chunk_size"),
        threads: arg_parser
            .is_present("threads")
            .then(|| arg_parser.value_of_t_or_exit("threads")),
        tmp_dir: arg_parser.value_of("tmp_dir").map(path::Path::new),
    };

    let started = Instant::now();
    let result = run(&args);
    let elapsed = started.elapsed();

    match result {
        Ok(None) => {}
        Ok(Some(summary)) => {
            log::info!(
                "sorting result: {} ({} records, {} chunks)",
                args.output.display(),
                summary.records,
                summary.chunks
            );
            log::info!("run time: {}", format_elapsed(elapsed));
        }
        Err(err) => {
            log::error!("data sorting error: {}", err);
            let mut cause = err.source();
            while let Some(err) = cause {
                log::error!("caused by: {}", err);
                cause = err.source();
            }
            log::info!("run time: {}", format_elapsed(elapsed));
            process::exit(1);
        }
    }
}

struct SortArgs<'a> {
    input: &'a path::Path,
    output: &'a path::Path,
    chunk_size: usize,
    threads: Option<usize>,
    tmp_dir: Option<&'a path::Path>,
}

/// Sorts the input file into the output file.
/// A missing input is reported and yields `Ok(None)`: nothing is created in that case.
fn run(args: &SortArgs) -> Result<Option<SortSummary>, SortError> {
    if !args.input.is_file() {
        log::error!(
            "input file {} doesn't exist, specify one with '--input' flag",
            args.input.display()
        );
        return Ok(None);
    }

    let mut pipeline_builder = SortPipelineBuilder::new().with_chunk_size(args.chunk_size);
    if let Some(threads) = args.threads {
        pipeline_builder = pipeline_builder.with_threads_number(threads);
    }

    if let Some(tmp_dir) = args.tmp_dir {
        pipeline_builder = pipeline_builder.with_tmp_dir(tmp_dir);
    }

    let summary = pipeline_builder.build()?.sort_file(args.input, args.output)?;

    return Ok(Some(summary));
}

#[derive(Copy, Clone, clap::ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as clap::ValueEnum>::from_str(s, false)
    }
}

fn positive_number(value: &str) -> Result<(), String> {
    match value.parse::<usize>() {
        Ok(0) => Err("value must be positive".to_string()),
        Ok(_) => Ok(()),
        Err(err) => Err(format!("value must be a positive integer: {}", err)),
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::Command::new("large-sort")
        .about("sorts large files of <number>.<text> records")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("file to be sorted")
                .required(true)
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("file to save sorted content to")
                .takes_value(true)
                .default_value("./sorted.txt"),
        )
        .arg(
            clap::Arg::new("chunk_size")
                .short('c')
                .long("chunk-size")
                .help("number of lines per chunk")
                .takes_value(true)
                .default_value(DEFAULT_CHUNK_SIZE_ARG)
                .validator(positive_number),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LogLevel::possible_values()),
        )
        .arg(
            clap::Arg::new("threads")
                .short('t')
                .long("threads")
                .help("number of threads to use for parallel sorting")
                .takes_value(true)
                .validator(positive_number),
        )
        .arg(
            clap::Arg::new("tmp_dir")
                .short('d')
                .long("tmp-dir")
                .help("directory to be used to store temporary data")
                .takes_value(true),
        )
        .get_matches()
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(match log_level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        })
        .format_timestamp_millis()
        .init();
}
