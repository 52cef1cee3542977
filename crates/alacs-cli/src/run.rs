//! The `loops` + round-trip-assertion loop: generate a random tree,
//! push it through `to_plain`/`from_plain` and `encode`/`decode`, and
//! fail loudly the moment any round-trip invariant doesn't hold.

use std::path::PathBuf;

use alacs_core::model::{file_eq, file_eq_ignoring_comments};
use alacs_core::Engine;
use alacs_fuzz::Random;
use anyhow::{bail, Context};

use crate::stats::Timer;

pub struct Args {
    pub pstats: Option<PathBuf>,
    pub loops: usize,
    pub deepest: usize,
    pub widest: usize,
}

#[derive(Default)]
struct Timers {
    encode: Timer,
    decode: Timer,
    to_plain: Timer,
    from_plain: Timer,
}

impl Timers {
    fn print(&self) {
        println!("   ALACS");
        if let Some(stats) = self.encode.stats() {
            println!("\tencode     = {stats}");
        }
        if let Some(stats) = self.decode.stats() {
            println!("\tdecode     = {stats}");
        }
        if let Some(stats) = self.to_plain.stats() {
            println!("\tto_plain   = {stats}");
        }
        if let Some(stats) = self.from_plain.stats() {
            println!("\tfrom_plain = {stats}");
        }
    }

    fn summary(&self) -> String {
        let mut out = String::from("ALACS timings\n");
        for (label, timer) in [
            ("encode", &self.encode),
            ("decode", &self.decode),
            ("to_plain", &self.to_plain),
            ("from_plain", &self.from_plain),
        ] {
            if let Some(stats) = timer.stats() {
                out.push_str(&format!("{label}: {stats}\n"));
            }
        }
        out
    }
}

/// Run `args.loops` rounds of generate-then-round-trip, then print (or
/// persist to `args.pstats`) the per-phase timing summary.
///
/// # Errors
///
/// Returns an error if `args.pstats` already exists (refusing to
/// overwrite it), if writing the summary fails, or if any round-trip
/// invariant is violated.
pub fn run(args: &Args) -> anyhow::Result<()> {
    if let Some(pstats) = &args.pstats {
        if pstats.exists() {
            bail!("won't overwrite: {}", pstats.display());
        }
    }

    let mut random = Random::new(rand::thread_rng(), args.deepest, args.widest);
    let mut engine = Engine::new();
    let mut timers = Timers::default();

    for iteration in 0..args.loops {
        let file = random.file();

        let plain = timers
            .to_plain
            .time(|| engine.to_plain(&file))
            .with_context(|| format!("iteration {iteration}: to_plain"))?;
        let rebuilt = timers
            .from_plain
            .time(|| engine.from_plain(&plain))
            .with_context(|| format!("iteration {iteration}: from_plain"))?;
        if !file_eq_ignoring_comments(&file, &rebuilt) {
            bail!("iteration {iteration}: to plain and back produced a different tree");
        }

        let bytes = timers
            .encode
            .time(|| engine.encode(&file))
            .with_context(|| format!("iteration {iteration}: encode"))?;
        let decoded = timers
            .decode
            .time(|| engine.decode(&bytes))
            .with_context(|| format!("iteration {iteration}: decode"))?;
        if !file_eq(&file, &decoded) {
            bail!("iteration {iteration}: encode then decode produced a different tree");
        }

        let reencoded = engine
            .encode(&decoded)
            .with_context(|| format!("iteration {iteration}: re-encode"))?;
        if reencoded != bytes {
            bail!("iteration {iteration}: encode(decode(bytes)) != bytes");
        }
    }

    if args.loops == 0 {
        return Ok(());
    }

    match &args.pstats {
        Some(path) => {
            std::fs::write(path, timers.summary())
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => timers.print(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{run, Args};

    #[test]
    fn zero_loops_is_a_no_op() {
        let args = Args {
            pstats: None,
            loops: 0,
            deepest: 4,
            widest: 4,
        };
        run(&args).unwrap();
    }

    #[test]
    fn short_run_round_trips_cleanly() {
        let args = Args {
            pstats: None,
            loops: 5,
            deepest: 3,
            widest: 3,
        };
        run(&args).unwrap();
    }

    #[test]
    fn pstats_refuses_to_overwrite_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        std::fs::write(&path, "existing").unwrap();
        let args = Args {
            pstats: Some(path),
            loops: 1,
            deepest: 2,
            widest: 2,
        };
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("won't overwrite"));
    }

    #[test]
    fn pstats_writes_a_summary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        let args = Args {
            pstats: Some(path.clone()),
            loops: 2,
            deepest: 2,
            widest: 2,
        };
        run(&args).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("ALACS timings"));
    }
}
