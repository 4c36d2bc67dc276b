use std::path;
use std::process;
use std::time::Instant;

use bytesize::ByteSize;
use env_logger;
use log;

use large_sort::generator::{generate_file, init_corpus};
use large_sort::stage::format_elapsed;

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: log::LevelFilter = arg_parser.value_of_t_or_exit("log_level");
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    match arg_parser.subcommand() {
        Some(("init", init_args)) => init(init_args),
        _ => generate(&arg_parser),
    }
}

fn init(arg_parser: &clap::ArgMatches) {
    let input = path::Path::new(arg_parser.value_of("input").expect("value is required"));
    if !input.is_file() {
        log::error!("input text file {} doesn't exist", input.display());
        return;
    }

    let output = path::Path::new(arg_parser.value_of("output").expect("value has default"));
    match init_corpus(input, output) {
        Ok(segments) => log::info!("source file: {} ({} texts)", output.display(), segments),
        Err(err) => {
            log::error!("source initialization error: {}", err);
            process::exit(1);
        }
    }
}

fn generate(arg_parser: &clap::ArgMatches) {
    let source = path::Path::new(arg_parser.value_of("source").expect("value has default"));
    if !source.is_file() {
        log::error!(
            "source file {} doesn't exist, create one with 'init' command or specify it with '--source' flag",
            source.display()
        );
        return;
    }

    let output = path::Path::new(arg_parser.value_of("output").expect("value has default"));
    let size = arg_parser
        .value_of("size")
        .expect("value has default")
        .parse::<ByteSize>()
        .expect("value is pre-validated")
        .as_u64();

    let started = Instant::now();
    let result = generate_file(source, output, size);
    let elapsed = started.elapsed();

    match result {
        Ok(written) => {
            log::info!("{} of records generated to {}", ByteSize::b(written), output.display());
            log::info!("run time: {}", format_elapsed(elapsed));
        }
        Err(err) => {
            log::error!("data generation error: {}", err);
            log::info!("run time: {}", format_elapsed(elapsed));
            process::exit(1);
        }
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::Command::new("large-sort-generate")
        .about("generates files of random <number>.<text> records")
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("file to save generated content to")
                .takes_value(true)
                .default_value("./default.txt"),
        )
        .arg(
            clap::Arg::new("size")
                .short('s')
                .long("size")
                .help("generated content size, for example 512MiB")
                .takes_value(true)
                .default_value("1GiB")
                .validator(|v| match v.parse::<ByteSize>() {
                    Ok(_) => Ok(()),
                    Err(err) => Err(format!("Size format incorrect: {}", err)),
                }),
        )
        .arg(
            clap::Arg::new("source")
                .long("source")
                .help("text corpus, one candidate record text per line")
                .takes_value(true)
                .default_value("./source.txt"),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .global(true)
                .default_value("info")
                .possible_values(["off", "error", "warn", "info", "debug", "trace"]),
        )
        .subcommand(
            clap::Command::new("init")
                .about("builds the text corpus from random segments of a text file")
                .arg(
                    clap::Arg::new("input")
                        .short('i')
                        .long("input")
                        .help("text file to cut corpus texts from")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("file to save the corpus to")
                        .takes_value(true)
                        .default_value("./source.txt"),
                ),
        )
        .get_matches()
}
