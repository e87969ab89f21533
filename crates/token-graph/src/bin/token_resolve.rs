//! `token-resolve`: print the resolved type and value of every token.
//!
//! Usage:
//!   token-resolve < tokens.json
//!
//! Reads a single-tree or resolver document from stdin and writes a JSON
//! object keyed by token name. Parse errors go to stderr and make the exit
//! status 1. Set `RUST_LOG=debug` for a trace of the parse.

use std::io::{self, Read};
use std::process::ExitCode;

use token_graph::cli::resolve_document;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let out = match resolve_document(&buf) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    for error in &out.errors {
        eprintln!("{error}");
    }
    match serde_json::to_string_pretty(&out.document) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }
    if out.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
