//! Development tasks for the fixed-pool workspace.
//!
//! Invoke with `cargo run -p xtask -- <task>`. `ci` is what the pipeline runs;
//! the other tasks are its pieces, plus the benchmark and the walkthrough.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use xshell::{Shell, cmd};

const POOL_CRATE: &str = "fixed-pool";
const TESTING_CRATE: &str = "fixed-pool-testing";

#[derive(Parser)]
#[command(name = "xtask", about = "Development tasks for fixed-pool")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Lint, test, then run the property and stress suites with CI settings
    Ci,
    /// rustfmt and clippy over every target; `--fix` rewrites in place
    Lint {
        #[arg(long)]
        fix: bool,
    },
    /// Unit, integration, and doc tests of the pool crates
    Test,
    /// Property suite with a raised case count
    Props {
        /// Cases per property
        #[arg(long, default_value_t = 2048)]
        cases: u32,
    },
    /// Repeat the threaded tests in release mode
    Stress {
        #[arg(long, default_value_t = 25)]
        runs: u32,
        /// Only tests whose name contains this
        #[arg(long, default_value = "concurrent")]
        filter: String,
    },
    /// Criterion acquire/release benchmark
    Bench {
        /// Record results under this baseline name
        #[arg(long, conflicts_with = "against")]
        save: Option<String>,
        /// Compare with a baseline recorded earlier
        #[arg(long)]
        against: Option<String>,
    },
    /// Run the pool_usage walkthrough with pool tracing enabled
    Walkthrough,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(workspace_dir()?);

    match cli.task {
        Task::Ci => {
            step("lint", || lint(&sh, false))?;
            step("test", || test(&sh))?;
            step("props", || props(&sh, 1024))?;
            step("stress", || stress(&sh, 10, "concurrent"))?;
            step("walkthrough", || walkthrough(&sh))?;
        }
        Task::Lint { fix } => lint(&sh, fix)?,
        Task::Test => test(&sh)?,
        Task::Props { cases } => props(&sh, cases)?,
        Task::Stress { runs, filter } => stress(&sh, runs, &filter)?,
        Task::Bench { save, against } => bench(&sh, save.as_deref(), against.as_deref())?,
        Task::Walkthrough => walkthrough(&sh)?,
    }

    Ok(())
}

// xtask sits one level below the workspace root.
fn workspace_dir() -> Result<&'static Path> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .context("xtask manifest has no parent directory")
}

fn step(name: &str, task: impl FnOnce() -> Result<()>) -> Result<()> {
    eprintln!("==> {name}");
    let started = Instant::now();
    task().with_context(|| format!("`{name}` failed"))?;
    eprintln!("<== {name} ({:.1}s)", started.elapsed().as_secs_f64());
    Ok(())
}

fn lint(sh: &Shell, fix: bool) -> Result<()> {
    if fix {
        cmd!(sh, "cargo fmt --all").run()?;
        cmd!(sh, "cargo clippy --workspace --all-targets --fix --allow-dirty --allow-staged").run()?;
    } else {
        cmd!(sh, "cargo fmt --all --check").run()?;
        cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?;
    }
    Ok(())
}

fn test(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo test -p {POOL_CRATE}").run()?;
    cmd!(sh, "cargo test -p {TESTING_CRATE}").run()?;
    Ok(())
}

fn props(sh: &Shell, cases: u32) -> Result<()> {
    ensure!(cases > 0, "--cases must be positive");
    let _cases = sh.push_env("PROPTEST_CASES", cases.to_string());
    cmd!(sh, "cargo test -p {POOL_CRATE} --test properties --release").run()?;
    Ok(())
}

fn stress(sh: &Shell, runs: u32, filter: &str) -> Result<()> {
    ensure!(runs > 0, "--runs must be positive");
    cmd!(sh, "cargo test -p {POOL_CRATE} --release --no-run").quiet().run()?;
    for run in 1..=runs {
        cmd!(sh, "cargo test -p {POOL_CRATE} --release -q -- {filter}")
            .quiet()
            .ignore_stdout()
            .run()
            .with_context(|| format!("run {run} of {runs}"))?;
    }
    eprintln!("{runs} runs of '{filter}' passed");
    Ok(())
}

fn bench(sh: &Shell, save: Option<&str>, against: Option<&str>) -> Result<()> {
    let mut criterion_args: Vec<&str> = Vec::new();
    if let Some(name) = save {
        criterion_args.extend(["--save-baseline", name]);
    }
    if let Some(name) = against {
        criterion_args.extend(["--baseline", name]);
    }
    cmd!(sh, "cargo bench -p {POOL_CRATE} --bench acquire_release -- {criterion_args...}").run()?;
    Ok(())
}

fn walkthrough(sh: &Shell) -> Result<()> {
    let _log = sh.push_env("RUST_LOG", "fixed_pool=debug");
    cmd!(sh, "cargo run -p {POOL_CRATE} --example pool_usage").run()?;
    Ok(())
}
