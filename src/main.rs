//! `janus [FILE]`: load and run a script non-interactively when given a
//! path, otherwise start the interactive shell. Exit code 0 on a clean
//! quit or a script that ran without error, 1 if any statement in a
//! non-interactively run script failed.

use std::fs;
use std::process::ExitCode;

use clap::Parser;

use janus::diagnostics;
use janus::repl::{self, IState};

/// An interactive checker and evaluator for a quantitatively-typed
/// dependent lambda calculus.
#[derive(Parser, Debug)]
#[command(name = "janus", version, about)]
struct Cli {
    /// A script of `assume`/`let`/`:type`/... statements to run
    /// non-interactively. Without this, `janus` starts the REPL.
    file: Option<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.file {
        Some(path) => run_file(&path),
        None => {
            if let Err(err) = repl::run(IState::new()) {
                eprintln!("{}", err);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        },
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("could not read `{}`: {}", path, err);
            return ExitCode::FAILURE;
        },
    };

    let mut state = IState::new();
    match repl::run_script(&mut state, &source) {
        Ok(outputs) => {
            for line in outputs {
                if !line.is_empty() {
                    println!("{}", line);
                }
            }
            ExitCode::SUCCESS
        },
        Err(err) => {
            diagnostics::report(path, &source, &err);
            ExitCode::FAILURE
        },
    }
}
