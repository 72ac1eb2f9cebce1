use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use codei::interpreter::{Config, DEFAULT_MAX_LOOP_ITERATIONS};
use codei::runner::{self, EXIT_IO};
use std::fs;
use std::path::Path;

fn main() {
    let matches = cli().get_matches();

    init_tracing(matches.get_flag("verbose"));

    let config = config_from(&matches);
    let code = match matches.get_one::<String>("file") {
        Some(file_path) => run_file(file_path, config),
        None => EXIT_IO,
    };
    std::process::exit(code);
}

fn cli() -> Command {
    Command::new("codei")
        .about("Interpreter for the CODE teaching language")
        .arg(
            Arg::new("file")
                .help("The CODE program to execute")
                .value_name("FILE")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("max-iterations")
                .long("max-iterations")
                .help(format!(
                    "Iterations a WHILE loop may run before it is reported as infinite [default: {}]",
                    DEFAULT_MAX_LOOP_ITERATIONS
                ))
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("no-prompt")
                .long("no-prompt")
                .help("Do not print a prompt before reading SCAN input")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log interpreter activity to stderr")
                .action(ArgAction::SetTrue),
        )
}

fn config_from(matches: &ArgMatches) -> Config {
    Config {
        max_loop_iterations: matches
            .get_one::<usize>("max-iterations")
            .copied()
            .unwrap_or(DEFAULT_MAX_LOOP_ITERATIONS),
        scan_prompts: !matches.get_flag("no-prompt"),
    }
}

/// `RUST_LOG` wins when set; otherwise `--verbose` turns on debug logs.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "codei=debug" } else { "error" })
    });
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn run_file(path: &str, config: Config) -> i32 {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        return EXIT_IO;
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            let filename = path.display().to_string();
            runner::run(&source, Some(filename.as_str()), config)
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            EXIT_IO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_limit_defaults_to_the_library_constant() {
        let matches = cli().try_get_matches_from(["codei", "prog.code"]).unwrap();
        let config = config_from(&matches);
        assert_eq!(config.max_loop_iterations, DEFAULT_MAX_LOOP_ITERATIONS);
        assert!(config.scan_prompts);
    }

    #[test]
    fn flags_override_the_defaults() {
        let matches = cli()
            .try_get_matches_from(["codei", "--max-iterations", "5", "--no-prompt", "prog.code"])
            .unwrap();
        let config = config_from(&matches);
        assert_eq!(config.max_loop_iterations, 5);
        assert!(!config.scan_prompts);
    }

    #[test]
    fn a_program_file_is_required() {
        assert!(cli().try_get_matches_from(["codei"]).is_err());
    }
}
