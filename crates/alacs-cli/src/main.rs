#![doc = include_str!("../README.md")]

use std::path::PathBuf;
use std::process::ExitCode;

use bpaf::Bpaf;
use tracing_subscriber::prelude::*;

mod run;
mod stats;

/// Fuzz the ALACS engine with bounded-depth random trees and check its
/// round-trip invariants.
#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
struct Cli {
    /// Write a timing summary here instead of stdout (fails if the file already exists)
    #[bpaf(long("pstats"), argument("PATH"))]
    pstats: Option<PathBuf>,

    /// Number of generate-then-round-trip repetitions
    #[bpaf(long("loops"), argument("N"), fallback(250))]
    loops: usize,

    /// Bound the depth of each generated random tree
    #[bpaf(long("deepest"), argument("N"), fallback(6))]
    deepest: usize,

    /// Bound the breadth of each generated random tree
    #[bpaf(long("widest"), argument("N"), fallback(8))]
    widest: usize,
}

fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("ALACS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    setup_tracing();
    let cli = cli().run();
    let args = run::Args {
        pstats: cli.pstats,
        loops: cli.loops,
        deepest: cli.deepest,
        widest: cli.widest,
    };
    match run::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("FAILED {err}");
            ExitCode::FAILURE
        }
    }
}
