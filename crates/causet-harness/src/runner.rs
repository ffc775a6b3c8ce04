//! Pipeline execution engine.
//!
//! A run walks a fixture through the stages in order:
//!
//! ```text
//! adjacency -> [closure -> [reduction]] -> longest_path -> separation -> verify
//! ```
//!
//! Every stage emits exactly one structured log entry with its outcome and
//! duration. The first failing stage aborts the run.

use std::time::Instant;

use causet_core::{
    DenseMatrix, Estimator, LongestPathOutcome, SpacelikeSeparation, longest_paths,
    spacelike_matrix, transitive_completion, transitive_reduction,
};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::fixtures::MatrixFixture;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, Stage};

/// Absolute tolerance when comparing separations; two-link values are averages.
const SEPARATION_TOLERANCE: f64 = 1e-9;

/// Timing and outcome of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: Outcome,
    pub duration_us: u64,
}

/// A computed output that disagrees with the fixture's expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub output: String,
    pub detail: String,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub fixture: String,
    pub nodes: usize,
    pub stages: Vec<StageReport>,
    pub adjacency: DenseMatrix,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closure: Option<DenseMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduction: Option<DenseMatrix>,
    pub longest_paths: LongestPathOutcome,
    pub separation: SpacelikeSeparation,
    pub mismatches: Vec<Mismatch>,
}

impl PipelineReport {
    /// True when every expected output matched.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Runs fixtures through the pipeline.
pub struct PipelineRunner {
    /// Identifier stamped on every report and log entry.
    pub run_id: String,
}

impl PipelineRunner {
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }

    /// Run one fixture, logging each stage to `log`.
    pub fn run(
        &self,
        fixture: &MatrixFixture,
        log: &mut LogEmitter,
    ) -> Result<PipelineReport, HarnessError> {
        let config = &fixture.pipeline;
        let mut ctx = RunContext {
            fixture: &fixture.name,
            nodes: None,
            emitter: log,
            stages: Vec::new(),
        };
        ctx.emitter.emit_entry(
            LogEntry::new("", LogLevel::Info, "run_start")
                .with_fixture(&fixture.name)
                .with_details(serde_json::to_value(config)?),
        )?;

        let adjacency = ctx.stage(Stage::Adjacency, None, || fixture.adjacency_matrix(), |_| None)?;
        ctx.nodes = Some(adjacency.rows());

        let closure = if config.close || config.reduce {
            Some(ctx.stage(
                Stage::Closure,
                None,
                || Ok(transitive_completion(&adjacency)?),
                |closed| Some(serde_json::json!({ "relations": closed.sum() as u64 })),
            )?)
        } else {
            ctx.skip(Stage::Closure)?;
            None
        };

        let reduction = match (&closure, config.reduce) {
            (Some(closed), true) => Some(ctx.stage(
                Stage::Reduction,
                None,
                || Ok(transitive_reduction(closed, &config.reduction)?),
                |links| Some(serde_json::json!({ "links": links.sum() as u64 })),
            )?),
            _ => {
                ctx.skip(Stage::Reduction)?;
                None
            }
        };

        let longest = ctx.stage(
            Stage::LongestPath,
            None,
            || Ok(longest_paths(&adjacency, &config.longest_path)?),
            |out| {
                Some(serde_json::json!({
                    "power_state": out.state,
                    "diameter": out.diameter,
                    "exact": out.is_exact(),
                }))
            },
        )?;

        let separation = ctx.stage(
            Stage::Separation,
            Some(config.separation.estimator),
            || Ok(spacelike_matrix(&longest.matrix, &config.separation)?),
            |sep| {
                Some(serde_json::json!({
                    "dmax": sep.dmax,
                    "landmarks": sep.landmarks,
                    "timelike_pairs": sep.timelike_pairs,
                    "spacelike_pairs": sep.spacelike_pairs,
                    "saturated_pairs": sep.saturated_pairs,
                    "skipped_pairs": sep.skipped_pairs,
                }))
            },
        )?;

        let mut report = PipelineReport {
            run_id: self.run_id.clone(),
            fixture: fixture.name.clone(),
            nodes: adjacency.rows(),
            stages: Vec::new(),
            adjacency,
            closure,
            reduction,
            longest_paths: longest,
            separation,
            mismatches: Vec::new(),
        };
        report.mismatches = verify(fixture, &report);
        ctx.verify_entry(&report.mismatches, fixture.expected.is_empty())?;

        ctx.emitter.emit_entry(
            LogEntry::new("", LogLevel::Info, "run_end")
                .with_fixture(&fixture.name)
                .with_nodes(report.nodes)
                .with_outcome(if report.passed() {
                    Outcome::Pass
                } else {
                    Outcome::Fail
                }),
        )?;
        ctx.emitter.flush()?;
        report.stages = ctx.stages;
        Ok(report)
    }
}

struct RunContext<'a> {
    fixture: &'a str,
    nodes: Option<usize>,
    emitter: &'a mut LogEmitter,
    stages: Vec<StageReport>,
}

impl RunContext<'_> {
    fn entry(&self, level: LogLevel, event: &str, stage: Stage) -> LogEntry {
        let entry = LogEntry::new("", level, event)
            .with_fixture(self.fixture)
            .with_stage(stage);
        match self.nodes {
            Some(n) => entry.with_nodes(n),
            None => entry,
        }
    }

    /// Time `f`, log its outcome, and attribute core errors to `stage`.
    fn stage<T>(
        &mut self,
        stage: Stage,
        estimator: Option<Estimator>,
        f: impl FnOnce() -> Result<T, HarnessError>,
        details: impl FnOnce(&T) -> Option<serde_json::Value>,
    ) -> Result<T, HarnessError> {
        let start = Instant::now();
        let result = f();
        let duration_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        let (level, event, outcome) = match result {
            Ok(_) => (LogLevel::Info, "stage_complete", Outcome::Pass),
            Err(_) => (LogLevel::Error, "stage_failed", Outcome::Error),
        };
        let mut entry = self
            .entry(level, event, stage)
            .with_outcome(outcome)
            .with_duration_us(duration_us);
        if let Some(est) = estimator {
            entry = entry.with_estimator(est.as_str());
        }
        self.stages.push(StageReport {
            stage,
            outcome,
            duration_us,
        });

        match result {
            Ok(value) => {
                if let Some(d) = details(&value) {
                    entry = entry.with_details(d);
                }
                self.emitter.emit_entry(entry)?;
                Ok(value)
            }
            Err(err) => {
                let err = match err {
                    HarnessError::Causet(source) => HarnessError::Core {
                        fixture: self.fixture.to_string(),
                        stage,
                        source,
                    },
                    other => other,
                };
                self.emitter.emit_entry(entry.with_error(err.to_string()))?;
                self.emitter.flush()?;
                Err(err)
            }
        }
    }

    fn skip(&mut self, stage: Stage) -> Result<(), HarnessError> {
        self.stages.push(StageReport {
            stage,
            outcome: Outcome::Skip,
            duration_us: 0,
        });
        let entry = self
            .entry(LogLevel::Debug, "stage_skipped", stage)
            .with_outcome(Outcome::Skip);
        self.emitter.emit_entry(entry)?;
        Ok(())
    }

    fn verify_entry(
        &mut self,
        mismatches: &[Mismatch],
        nothing_expected: bool,
    ) -> Result<(), HarnessError> {
        if nothing_expected {
            return self.skip(Stage::Verify);
        }
        let (entry, outcome) = if mismatches.is_empty() {
            (
                self.entry(LogLevel::Info, "verify_pass", Stage::Verify),
                Outcome::Pass,
            )
        } else {
            (
                self.entry(LogLevel::Warn, "verify_fail", Stage::Verify)
                    .with_details(serde_json::to_value(mismatches)?),
                Outcome::Fail,
            )
        };
        let entry = entry.with_outcome(outcome);
        self.stages.push(StageReport {
            stage: Stage::Verify,
            outcome,
            duration_us: 0,
        });
        self.emitter.emit_entry(entry)?;
        Ok(())
    }
}

/// Compare a report's outputs against the fixture's expectations.
fn verify(fixture: &MatrixFixture, report: &PipelineReport) -> Vec<Mismatch> {
    let expected = &fixture.expected;
    let checks: [(&str, Option<&DenseMatrix>, Option<&DenseMatrix>, f64); 4] = [
        ("closure", expected.closure.as_ref(), report.closure.as_ref(), 0.0),
        ("reduction", expected.reduction.as_ref(), report.reduction.as_ref(), 0.0),
        (
            "longest_paths",
            expected.longest_paths.as_ref(),
            Some(&report.longest_paths.matrix),
            0.0,
        ),
        (
            "separations",
            expected.separations.as_ref(),
            Some(&report.separation.matrix),
            SEPARATION_TOLERANCE,
        ),
    ];

    checks
        .into_iter()
        .filter_map(|(output, want, got, tol)| {
            let want = want?;
            let detail = match got {
                None => Some("stage was not run".to_string()),
                Some(got) => first_difference(want, got, tol),
            };
            detail.map(|detail| Mismatch {
                output: output.to_string(),
                detail,
            })
        })
        .collect()
}

fn first_difference(want: &DenseMatrix, got: &DenseMatrix, tol: f64) -> Option<String> {
    if want.rows() != got.rows() || want.cols() != got.cols() {
        return Some(format!(
            "shape: expected {}x{}, found {}x{}",
            want.rows(),
            want.cols(),
            got.rows(),
            got.cols()
        ));
    }
    (0..want.rows())
        .flat_map(|i| (0..want.cols()).map(move |j| (i, j)))
        .find(|&(i, j)| (want[(i, j)] - got[(i, j)]).abs() > tol)
        .map(|(i, j)| {
            format!(
                "({i},{j}): expected {}, found {}",
                want[(i, j)],
                got[(i, j)]
            )
        })
}
