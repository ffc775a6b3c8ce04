//! Randomized structural properties of the causal-set kernels.
//!
//! DAGs are drawn from a deterministic xorshift stream so failures reproduce.
//!
//! Run: cargo test -p causet-core --test dag_properties_test

use causet_core::{
    CausetError, DenseMatrix, ReductionConfig, SeparationConfig, longest_path_matrix,
    naive_spacelike_matrix, spacelike_matrix, transitive_completion, transitive_reduction,
    twolink_spacelike_matrix,
};

#[derive(Clone, Copy, Debug)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Bernoulli draw with probability `num / den`.
    fn chance(&mut self, num: u64, den: u64) -> bool {
        self.next_u64() % den < num
    }
}

/// Random DAG on `n` nodes; edges only run from lower to higher index.
fn random_dag(rng: &mut XorShift64, n: usize, num: u64, den: u64) -> DenseMatrix {
    let mut a = DenseMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..i {
            if rng.chance(num, den) {
                a.set(i, j, 1.0);
            }
        }
    }
    a
}

fn cases() -> Vec<DenseMatrix> {
    let mut rng = XorShift64::new(0xC0FF_EE12_3456_789B);
    let mut out = Vec::new();
    for n in [1, 2, 5, 9, 14] {
        for (num, den) in [(1, 6), (1, 3), (2, 3)] {
            out.push(random_dag(&mut rng, n, num, den));
        }
    }
    out
}

#[test]
fn closure_is_idempotent() {
    for a in cases() {
        let closed = transitive_completion(&a).unwrap();
        assert_eq!(transitive_completion(&closed).unwrap(), closed);
    }
}

#[test]
fn closure_matches_longest_path_support() {
    for a in cases() {
        let closed = transitive_completion(&a).unwrap();
        let lp = longest_path_matrix(&a, None).unwrap();
        assert_eq!(lp.support(), closed);
    }
}

#[test]
fn reduction_then_closure_reconstructs_relation() {
    for a in cases() {
        let closed = transitive_completion(&a).unwrap();
        let hasse = transitive_reduction(&closed, &ReductionConfig::default()).unwrap();
        assert_eq!(transitive_completion(&hasse).unwrap(), closed);
        // Every surviving edge is a link: its longest path is exactly 1.
        let lp = longest_path_matrix(&closed, None).unwrap();
        let n = closed.rows();
        for i in 0..n {
            for j in 0..n {
                assert_eq!(hasse[(i, j)] == 1.0, lp[(i, j)] == 1.0, "link mismatch at ({i},{j})");
            }
        }
    }
}

#[test]
fn reduction_with_diameter_cap_matches_default() {
    for a in cases() {
        let closed = transitive_completion(&a).unwrap();
        let diameter = longest_path_matrix(&closed, None).unwrap().max_entry() as usize;
        let full = transitive_reduction(&closed, &ReductionConfig::default()).unwrap();
        let capped = transitive_reduction(
            &closed,
            &ReductionConfig {
                max_path_len: Some(diameter.max(1)),
            },
        )
        .unwrap();
        assert_eq!(capped, full);
    }
}

#[test]
fn longest_paths_are_antisymmetric() {
    for a in cases() {
        let lp = longest_path_matrix(&a, None).unwrap();
        let n = lp.rows();
        for i in 0..n {
            assert_eq!(lp[(i, i)], 0.0);
            for j in 0..n {
                assert!(
                    lp[(i, j)] == 0.0 || lp[(j, i)] == 0.0,
                    "both directions non-zero at ({i},{j})"
                );
            }
        }
    }
}

#[test]
fn cutoff_is_elementwise_minimum() {
    for a in cases() {
        let exact = longest_path_matrix(&a, None).unwrap();
        for cutoff in 1..4 {
            let capped = longest_path_matrix(&a, Some(cutoff)).unwrap();
            let expected = exact.map(|v| v.min(cutoff as f64));
            assert_eq!(capped, expected, "cutoff {cutoff}");
        }
    }
}

#[test]
fn separations_are_symmetric_with_timelike_squares() {
    for a in cases().into_iter().filter(|a| !a.is_zero()) {
        let lp = longest_path_matrix(&a, None).unwrap();
        for ds2 in [
            naive_spacelike_matrix(&lp, None, None).unwrap(),
            twolink_spacelike_matrix(&lp, None).unwrap(),
        ] {
            let n = ds2.rows();
            for i in 0..n {
                assert_eq!(ds2[(i, i)], 0.0);
                for j in 0..n {
                    assert_eq!(ds2[(i, j)], ds2[(j, i)]);
                    if lp[(i, j)] > 0.0 {
                        assert_eq!(ds2[(i, j)], -(lp[(i, j)] * lp[(i, j)]));
                    } else if i != j && lp[(j, i)] == 0.0 {
                        assert!(ds2[(i, j)] > 0.0, "spacelike ({i},{j}) not filled");
                        assert!(ds2[(i, j)] <= lp.max_entry() * lp.max_entry());
                    }
                }
            }
        }
    }
}

#[test]
fn landmarks_at_or_above_n_match_unrestricted() {
    for a in cases().into_iter().filter(|a| !a.is_zero()) {
        let lp = longest_path_matrix(&a, None).unwrap();
        let n = lp.rows();
        let full = naive_spacelike_matrix(&lp, None, None).unwrap();
        for k in [n, n + 1, 3 * n] {
            assert_eq!(naive_spacelike_matrix(&lp, None, Some(k)).unwrap(), full);
        }
    }
}

#[test]
fn landmark_runs_agree_on_computed_entries() {
    for a in cases().into_iter().filter(|a| !a.is_zero()) {
        let lp = longest_path_matrix(&a, None).unwrap();
        let full = naive_spacelike_matrix(&lp, None, None).unwrap();
        let sep = spacelike_matrix(&lp, &SeparationConfig::naive().with_landmarks(2)).unwrap();
        let n = lp.rows();
        for i in 0..n {
            for j in 0..n {
                if sep.is_computed(i, j) {
                    assert_eq!(sep.matrix[(i, j)], full[(i, j)]);
                }
            }
        }
    }
}

#[test]
fn back_edge_is_rejected_everywhere() {
    let mut rng = XorShift64::new(7);
    let mut a = random_dag(&mut rng, 6, 1, 2);
    // Chain 0 -> 1 -> ... -> 5, then close the loop.
    for i in 1..6 {
        a.set(i, i - 1, 1.0);
    }
    a.set(0, 5, 1.0);
    assert!(matches!(
        transitive_completion(&a),
        Err(CausetError::CyclicInput { .. })
    ));
    assert!(matches!(
        longest_path_matrix(&a, None),
        Err(CausetError::NonConvergent { .. })
    ));
}
