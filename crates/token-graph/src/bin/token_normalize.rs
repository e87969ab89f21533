//! `token-normalize`: parse a token document and write it back canonically.
//!
//! Usage:
//!   token-normalize < tokens.json
//!
//! Inherited `$type`s are dropped, coincident values move under `$root` and
//! resolver sources are merged into one per set or context. Parse errors go
//! to stderr and make the exit status 1.

use std::io::{self, Read};
use std::process::ExitCode;

use token_graph::cli::normalize_document;
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

    match normalize_document(&buf) {
        Ok(out) => {
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
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
