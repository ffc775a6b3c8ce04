//! # All-pairs longest paths by matrix powering
//!
//! `LP[i, j]` is the number of edges on the longest directed path from `j` to
//! `i`, or 0 when no path exists. It is built from successive powers of the
//! adjacency matrix: `A^k[i, j] > 0` iff a walk of exactly `k` edges joins
//! the pair, and on a DAG every walk is a path, so the largest such `k` is the
//! longest path.
//!
//! ## State machine
//!
//! The powering loop is an explicit bounded state machine:
//!
//! ```text
//! Iterating{k} --B == 0------------> Saturated{k-1}
//! Iterating{k} --k == cutoff-------> CutoffReached{k}
//! Iterating{k} --k >= N, B != 0----> NonConvergent{k}
//! Iterating{k} --otherwise---------> Iterating{k+1}
//! ```
//!
//! On an N-node DAG no walk has N edges, so reaching power N with a non-zero
//! power matrix proves a cycle.
//!
//! ## Cost
//!
//! One dense product per power: O(D * N^3) for diameter D with the scalar
//! kernel. This dominates everything else in the crate. With a cutoff `c` the
//! powering stops after `c` products, and pairs whose true longest path
//! exceeds `c` are raised to exactly `c` using a reachability closure built by
//! repeated squaring, so the total is `c + O(log N)` products.

use serde::{Deserialize, Serialize};

use crate::adjacency::{squared_closure, validate_adjacency};
use crate::config::LongestPathConfig;
use crate::error::{CausetError, Result};
use crate::matrix::DenseMatrix;

/// State of the powering loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PowerState {
    /// Next power to record.
    Iterating { power: usize },
    /// Power matrix vanished; `power` is the longest path recorded.
    Saturated { power: usize },
    /// Cutoff hit after recording `power`.
    CutoffReached { power: usize },
    /// Walks of length `power` still exist at the N-step bound.
    NonConvergent { power: usize },
}

impl PowerState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Iterating { .. })
    }

    #[must_use]
    pub const fn power(self) -> usize {
        match self {
            Self::Iterating { power }
            | Self::Saturated { power }
            | Self::CutoffReached { power }
            | Self::NonConvergent { power } => power,
        }
    }
}

/// Result of a completed engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongestPathOutcome {
    pub matrix: DenseMatrix,
    pub state: PowerState,
    /// Largest entry of `matrix`.
    pub diameter: usize,
}

impl LongestPathOutcome {
    /// False when a cutoff may have truncated some entries.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        matches!(self.state, PowerState::Saturated { .. })
    }
}

/// Stepwise longest-path computation over one adjacency matrix.
pub struct LongestPathEngine<'a> {
    adjacency: &'a DenseMatrix,
    nodes: usize,
    cutoff: Option<usize>,
    lengths: DenseMatrix,
    /// 0/1 support of the current adjacency power.
    walks: DenseMatrix,
    state: PowerState,
    products: usize,
}

impl<'a> LongestPathEngine<'a> {
    pub fn new(adjacency: &'a DenseMatrix, config: &LongestPathConfig) -> Result<Self> {
        config.validate()?;
        let nodes = validate_adjacency(adjacency)?;
        Ok(Self {
            adjacency,
            nodes,
            cutoff: config.cutoff,
            lengths: DenseMatrix::zeros(nodes, nodes),
            walks: adjacency.clone(),
            state: PowerState::Iterating { power: 1 },
            products: 0,
        })
    }

    #[must_use]
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Longest paths recorded so far.
    #[must_use]
    pub fn lengths(&self) -> &DenseMatrix {
        &self.lengths
    }

    /// Dense matrix products performed so far.
    #[must_use]
    pub fn products(&self) -> usize {
        self.products
    }

    /// Perform one transition. Terminal states are returned unchanged.
    pub fn step(&mut self) -> Result<PowerState> {
        let PowerState::Iterating { power } = self.state else {
            return Ok(self.state);
        };

        if self.walks.is_zero() {
            self.state = PowerState::Saturated { power: power - 1 };
            return Ok(self.state);
        }
        if power >= self.nodes {
            self.state = PowerState::NonConvergent { power };
            return Ok(self.state);
        }

        let length = power as f64;
        let candidate = self.walks.map(|v| if v > 0.0 { length } else { 0.0 });
        self.lengths = self.lengths.max_with(&candidate);

        let next = self.walks.matmul(self.adjacency)?.support();
        self.products += 1;
        if self.cutoff == Some(power) {
            if !next.is_zero() {
                // Walks longer than the cutoff: one more step, then any walk.
                let (closure, rounds) = squared_closure(self.adjacency)?;
                let beyond = next
                    .zip_map(&next.matmul(&closure)?, |a, b| a + b)
                    .support();
                self.products += rounds + 1;
                self.lengths = self.lengths.zip_map(&beyond, |len, reach| {
                    if reach > 0.0 { len.max(length) } else { len }
                });
            }
            self.state = PowerState::CutoffReached { power };
        } else {
            self.walks = next;
            self.state = PowerState::Iterating { power: power + 1 };
        }
        Ok(self.state)
    }

    /// Drive the state machine to a terminal state.
    pub fn run(mut self) -> Result<LongestPathOutcome> {
        while !self.step()?.is_terminal() {}

        if let PowerState::NonConvergent { power } = self.state {
            return Err(CausetError::NonConvergent {
                iterations: power,
                limit: self.nodes,
            });
        }
        if let Some(node) = (0..self.nodes).find(|&i| self.lengths.get(i, i) != 0.0) {
            return Err(CausetError::CyclicInput { node });
        }

        let diameter = self.lengths.max_entry() as usize;
        Ok(LongestPathOutcome {
            matrix: self.lengths,
            state: self.state,
            diameter,
        })
    }
}

/// Longest-path matrix with run metadata.
pub fn longest_paths(
    adjacency: &DenseMatrix,
    config: &LongestPathConfig,
) -> Result<LongestPathOutcome> {
    LongestPathEngine::new(adjacency, config)?.run()
}

/// Longest-path matrix of `adjacency`, optionally cut off at `dmax` edges.
pub fn longest_path_matrix(adjacency: &DenseMatrix, dmax: Option<usize>) -> Result<DenseMatrix> {
    longest_paths(adjacency, &LongestPathConfig { cutoff: dmax }).map(|out| out.matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[f64]]) -> DenseMatrix {
        DenseMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    /// Path graph 0 -> 1 -> ... -> n-1.
    fn path(n: usize) -> DenseMatrix {
        let mut a = DenseMatrix::zeros(n, n);
        for i in 1..n {
            a.set(i, i - 1, 1.0);
        }
        a
    }

    #[test]
    fn two_node_dag() {
        // Single edge: the longest-path matrix is the adjacency matrix itself.
        let a = m(&[&[0.0, 0.0], &[1.0, 0.0]]);
        assert_eq!(longest_path_matrix(&a, None).unwrap(), a);
        let b = a.transpose();
        let lp = longest_path_matrix(&b, None).unwrap();
        assert_eq!(lp[(0, 1)], 1.0);
        assert_eq!(lp.sum(), 1.0);
    }

    #[test]
    fn longest_not_shortest() {
        // 0 -> 1 -> 2 plus shortcut 0 -> 2.
        let a = m(&[&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], &[1.0, 1.0, 0.0]]);
        let out = longest_paths(&a, &LongestPathConfig::default()).unwrap();
        assert_eq!(out.matrix[(2, 0)], 2.0);
        assert_eq!(out.matrix[(1, 0)], 1.0);
        assert_eq!(out.diameter, 2);
        assert_eq!(out.state, PowerState::Saturated { power: 2 });
        assert!(out.is_exact());
    }

    #[test]
    fn path_graph_lengths() {
        let lp = longest_path_matrix(&path(5), None).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                let expected = if i > j { (i - j) as f64 } else { 0.0 };
                assert_eq!(lp[(i, j)], expected, "LP[{i},{j}]");
            }
        }
    }

    #[test]
    fn cutoff_caps_long_pairs_at_cutoff() {
        let lp = longest_path_matrix(&path(6), Some(2)).unwrap();
        for i in 0..6 {
            for j in 0..6 {
                let expected = if i > j { ((i - j) as f64).min(2.0) } else { 0.0 };
                assert_eq!(lp[(i, j)], expected, "LP[{i},{j}]");
            }
        }
    }

    #[test]
    fn cutoff_state_is_reported() {
        let out = longest_paths(&path(6), &LongestPathConfig { cutoff: Some(3) }).unwrap();
        assert_eq!(out.state, PowerState::CutoffReached { power: 3 });
        assert_eq!(out.diameter, 3);
        assert!(!out.is_exact());
    }

    #[test]
    fn cutoff_bounds_products_on_deep_graphs() {
        let a = path(300);
        let mut capped =
            LongestPathEngine::new(&a, &LongestPathConfig { cutoff: Some(2) }).unwrap();
        while !capped.step().unwrap().is_terminal() {}
        assert_eq!(capped.state(), PowerState::CutoffReached { power: 2 });
        assert!(capped.products() <= 2 + 10 + 1, "{} products", capped.products());
        assert_eq!(capped.lengths()[(299, 0)], 2.0);
        assert_eq!(capped.lengths()[(5, 4)], 1.0);
        assert_eq!(capped.lengths()[(4, 5)], 0.0);

        let mut exact = LongestPathEngine::new(&a, &LongestPathConfig::default()).unwrap();
        while !exact.step().unwrap().is_terminal() {}
        assert_eq!(exact.products(), 299);
        assert!(capped.products() * 10 < exact.products());
    }

    #[test]
    fn cutoff_above_diameter_is_exact_values() {
        let exact = longest_path_matrix(&path(4), None).unwrap();
        let capped = longest_path_matrix(&path(4), Some(10)).unwrap();
        assert_eq!(exact, capped);
    }

    #[test]
    fn zero_cutoff_rejected() {
        assert_eq!(
            longest_path_matrix(&path(3), Some(0)),
            Err(CausetError::InvalidCutoff)
        );
    }

    #[test]
    fn cycle_is_non_convergent() {
        let cyclic = m(&[
            &[0.0, 0.0, 1.0],
            &[1.0, 0.0, 0.0],
            &[0.0, 1.0, 0.0],
        ]);
        assert_eq!(
            longest_path_matrix(&cyclic, None),
            Err(CausetError::NonConvergent {
                iterations: 3,
                limit: 3
            })
        );
    }

    #[test]
    fn cycle_under_cutoff_is_still_rejected() {
        let cyclic = m(&[&[0.0, 1.0], &[1.0, 0.0]]);
        assert!(matches!(
            longest_path_matrix(&cyclic, Some(1)),
            Err(CausetError::CyclicInput { .. })
        ));
    }

    #[test]
    fn stepping_walks_the_state_machine() {
        let a = path(3);
        let mut engine = LongestPathEngine::new(&a, &LongestPathConfig::default()).unwrap();
        assert_eq!(engine.state(), PowerState::Iterating { power: 1 });
        assert_eq!(engine.step().unwrap(), PowerState::Iterating { power: 2 });
        assert_eq!(engine.lengths()[(2, 1)], 1.0);
        assert_eq!(engine.step().unwrap(), PowerState::Iterating { power: 3 });
        assert_eq!(engine.step().unwrap(), PowerState::Saturated { power: 2 });
        // Terminal states are sticky.
        assert_eq!(engine.step().unwrap(), PowerState::Saturated { power: 2 });
    }

    #[test]
    fn empty_and_edgeless_graphs() {
        let empty = DenseMatrix::zeros(0, 0);
        let out = longest_paths(&empty, &LongestPathConfig::default()).unwrap();
        assert_eq!(out.state, PowerState::Saturated { power: 0 });
        let edgeless = DenseMatrix::zeros(3, 3);
        assert!(longest_path_matrix(&edgeless, None).unwrap().is_zero());
    }
}
