//! CLI entrypoint for the causet harness.

use std::path::{Path, PathBuf};
use std::time::Instant;

use causet_core::{
    Estimator, LongestPathConfig, ReductionConfig, SeparationConfig, causet_adj_matrix,
    longest_path_matrix, longest_paths, spacelike_matrix, transitive_completion,
    transitive_reduction,
};
use causet_harness::fixtures::{fixture_paths, load_matrix};
use causet_harness::structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, Stage,
};
use causet_harness::{MatrixFixture, PipelineRunner};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

const LOG_SCOPE: &str = "causet";

/// Causal-set matrix tooling.
#[derive(Debug, Parser)]
#[command(name = "causet-harness")]
#[command(about = "Longest paths, closures and spacelike separations for causal-set DAGs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build an adjacency matrix from raw separations and coordinates.
    Adjacency {
        /// N x N separation matrix JSON (negative = timelike).
        #[arg(long)]
        separations: PathBuf,
        /// N x d coordinate matrix JSON (column 0 is time).
        #[arg(long)]
        coordinates: PathBuf,
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Append a structured JSONL entry to this log.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Transitive closure of an adjacency matrix.
    Close {
        /// Adjacency matrix JSON.
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Transitive reduction of a transitively closed adjacency matrix.
    Reduce {
        /// Closed adjacency matrix JSON.
        #[arg(long)]
        input: PathBuf,
        /// Only consider implying paths up to this many edges.
        #[arg(long)]
        max_path_len: Option<usize>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// All-pairs longest path lengths.
    LongestPath {
        /// Adjacency matrix JSON.
        #[arg(long)]
        input: PathBuf,
        /// Stop once paths of this length are recorded; longer entries are capped.
        #[arg(long, alias = "dmax")]
        cutoff: Option<usize>,
        /// Emit the full outcome (state, diameter) instead of the bare matrix.
        #[arg(long)]
        outcome: bool,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Signed squared separations from a longest-path matrix.
    Separation {
        /// Longest-path matrix JSON (or adjacency with --from-adjacency).
        #[arg(long)]
        input: PathBuf,
        /// Treat the input as an adjacency matrix and compute longest paths first.
        #[arg(long)]
        from_adjacency: bool,
        /// Spacelike estimator.
        #[arg(long, value_enum, default_value = "naive")]
        estimator: EstimatorArg,
        /// Ceiling distance for unbounded pairs (defaults to max longest path).
        #[arg(long)]
        dmax: Option<f64>,
        /// Restrict the naive estimator to the first K nodes.
        #[arg(long)]
        landmarks: Option<usize>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Run the full pipeline over a fixture file or directory of fixtures.
    Run {
        /// Fixture JSON file, or directory containing fixture JSON files.
        #[arg(long)]
        fixture: PathBuf,
        /// Directory for reports, the JSONL log and the artifact index.
        #[arg(long, default_value = "target/causet-harness")]
        out_dir: PathBuf,
        /// Run identifier (defaults to a timestamp-derived id).
        #[arg(long)]
        run_id: Option<String>,
    },
}

/// Estimator names accepted on the command line; anything else is rejected.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EstimatorArg {
    #[value(aliases = ["exact", "boundary"])]
    Naive,
    #[value(name = "twolink", aliases = ["two-link", "2link", "rideout"])]
    TwoLink,
}

impl From<EstimatorArg> for Estimator {
    fn from(arg: EstimatorArg) -> Self {
        match arg {
            EstimatorArg::Naive => Self::Naive,
            EstimatorArg::TwoLink => Self::TwoLink,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Adjacency {
            separations,
            coordinates,
            output,
            log,
        } => {
            let s = load_matrix(&separations)?;
            let r = load_matrix(&coordinates)?;
            let start = Instant::now();
            let result = causet_adj_matrix(&s, &r);
            log_single(log.as_deref(), Stage::Adjacency, s.rows(), None, start, &result)?;
            write_json(output.as_deref(), &result?)?;
        }
        Command::Close { input, output, log } => {
            let a = load_matrix(&input)?;
            let start = Instant::now();
            let result = transitive_completion(&a);
            log_single(log.as_deref(), Stage::Closure, a.rows(), None, start, &result)?;
            write_json(output.as_deref(), &result?)?;
        }
        Command::Reduce {
            input,
            max_path_len,
            output,
            log,
        } => {
            let a = load_matrix(&input)?;
            let start = Instant::now();
            let result = transitive_reduction(&a, &ReductionConfig { max_path_len });
            log_single(log.as_deref(), Stage::Reduction, a.rows(), None, start, &result)?;
            write_json(output.as_deref(), &result?)?;
        }
        Command::LongestPath {
            input,
            cutoff,
            outcome,
            output,
            log,
        } => {
            let a = load_matrix(&input)?;
            let start = Instant::now();
            let result = longest_paths(&a, &LongestPathConfig { cutoff });
            log_single(log.as_deref(), Stage::LongestPath, a.rows(), None, start, &result)?;
            let result = result?;
            if outcome {
                write_json(output.as_deref(), &result)?;
            } else {
                write_json(output.as_deref(), &result.matrix)?;
            }
        }
        Command::Separation {
            input,
            from_adjacency,
            estimator,
            dmax,
            landmarks,
            output,
            log,
        } => {
            let mut lp = load_matrix(&input)?;
            if from_adjacency {
                lp = longest_path_matrix(&lp, None)?;
            }
            let config = SeparationConfig {
                estimator: estimator.into(),
                dmax,
                landmarks,
            };
            let start = Instant::now();
            let result = spacelike_matrix(&lp, &config);
            log_single(
                log.as_deref(),
                Stage::Separation,
                lp.rows(),
                Some(config.estimator),
                start,
                &result,
            )?;
            let sep = result?;
            if sep.skipped_pairs > 0 {
                eprintln!(
                    "{} spacelike pairs left uncomputed by the landmark restriction",
                    sep.skipped_pairs
                );
            }
            write_json(output.as_deref(), &sep.matrix)?;
        }
        Command::Run {
            fixture,
            out_dir,
            run_id,
        } => {
            let run_id = run_id.unwrap_or_else(default_run_id);
            let paths = fixture_paths(&fixture)?;
            if paths.is_empty() {
                return Err(format!("No fixture JSON files found in {}", fixture.display()).into());
            }
            std::fs::create_dir_all(&out_dir)?;

            let log_path = out_dir.join(format!("{run_id}.log.jsonl"));
            let mut emitter = LogEmitter::to_file(&log_path, LOG_SCOPE, &run_id)?;
            let runner = PipelineRunner::new(&run_id);
            let mut index = ArtifactIndex::new(&run_id);
            let mut failed = Vec::new();

            eprintln!("Running {} fixture(s) as {run_id}", paths.len());
            for path in paths {
                let fixture = MatrixFixture::from_file(&path)?;
                match runner.run(&fixture, &mut emitter) {
                    Ok(report) => {
                        let report_path = out_dir.join(format!("{}.report.json", fixture.name));
                        std::fs::write(&report_path, report.to_json()?)?;
                        index.add_file(&report_path, "pipeline_report")?;
                        if report.passed() {
                            eprintln!("  PASS {}", fixture.name);
                        } else {
                            for m in &report.mismatches {
                                eprintln!("  FAIL {} [{}]: {}", fixture.name, m.output, m.detail);
                            }
                            failed.push(fixture.name.clone());
                        }
                    }
                    Err(err) => {
                        eprintln!("  ERROR {}: {err}", fixture.name);
                        failed.push(fixture.name.clone());
                    }
                }
            }
            emitter.flush()?;
            drop(emitter);

            index.add_file(&log_path, "log")?;
            let index_path = out_dir.join(format!("{run_id}.artifacts.json"));
            std::fs::write(&index_path, index.to_json()?)?;
            eprintln!("Artifact index written to {}", index_path.display());

            if !failed.is_empty() {
                return Err(
                    format!("{} fixture(s) failed: {}", failed.len(), failed.join(", ")).into(),
                );
            }
        }
    }

    Ok(())
}

fn write_json<T: Serialize>(
    output: Option<&Path>,
    value: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json + "\n")?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Append one entry describing a single-kernel invocation.
fn log_single<T, E: std::fmt::Display>(
    log: Option<&Path>,
    stage: Stage,
    nodes: usize,
    estimator: Option<Estimator>,
    start: Instant,
    result: &Result<T, E>,
) -> std::io::Result<()> {
    let Some(path) = log else {
        return Ok(());
    };
    let duration_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    let mut emitter = LogEmitter::append_to_file(path, LOG_SCOPE, &default_run_id())?;
    let mut entry = match result {
        Ok(_) => LogEntry::new("", LogLevel::Info, "stage_complete").with_outcome(Outcome::Pass),
        Err(err) => LogEntry::new("", LogLevel::Error, "stage_failed")
            .with_outcome(Outcome::Error)
            .with_error(err.to_string()),
    }
    .with_stage(stage)
    .with_nodes(nodes)
    .with_duration_us(duration_us);
    if let Some(est) = estimator {
        entry = entry.with_estimator(est.as_str());
    }
    emitter.emit_entry(entry)?;
    emitter.flush()
}

fn default_run_id() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("run-{}-{:03}", now.as_secs(), now.subsec_millis())
}
