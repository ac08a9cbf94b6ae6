//! §8 S6 exercised end to end: installing a caller-supplied separator
//! partition via `set_hss_partitioning` before factorization must not change
//! the solved answer, only the HSS partition tree the front compresses over.

use mfhss_core::{laplacian_1d, DMatrix, HssOptions, SparseFront};

use mfhss_algo::partitioning::{split_separator, SpectralBisection};
use mfhss_algo::{backward_multifrontal_solve, forward_multifrontal_solve, multifrontal_factorization, Front};

fn two_leaf_root(n: usize) -> Front<f64> {
    let mid = n / 2;
    let left = Front::leaf(0, mid - 1, vec![mid - 1]);
    let right = Front::leaf(mid, n, vec![mid - 1]);
    Front::new(mid - 1, mid, vec![], vec![left, right])
}

#[test]
fn installed_partitioning_does_not_change_the_solved_answer() {
    let n = 10;
    let a = laplacian_1d(n);
    let opts = HssOptions::default().with_leaf_size(4);
    let b = DMatrix::<f64>::from_fn(n, 1, |i, _| (i + 1) as f64);

    let mut baseline = two_leaf_root(n);
    multifrontal_factorization(&mut baseline, &a, &opts).unwrap();
    let state = forward_multifrontal_solve(&baseline, &b);
    let mut x_baseline = DMatrix::<f64>::zeros(n, 1);
    backward_multifrontal_solve(&baseline, &state, &mut x_baseline);

    let mut partitioned = two_leaf_root(n);
    // Replace the left leaf's default flat HSS partition with one explicitly
    // built over a recursively-bisected separator (§4.9 `set_HSS_partitioning`).
    let left = &mut partitioned.children[0];
    let ptr: Vec<usize> = a.get_ptr().to_vec();
    let ind: Vec<usize> = a.get_ind().to_vec();
    let sep_rows: Vec<usize> = (left.sep_begin..left.sep_end).collect();
    let sep_tree = split_separator(&ptr, &ind, &sep_rows, 1, 0, &SpectralBisection).unwrap();
    left.set_hss_partitioning(&sep_tree, 2).unwrap();

    multifrontal_factorization(&mut partitioned, &a, &opts).unwrap();
    let state = forward_multifrontal_solve(&partitioned, &b);
    let mut x_partitioned = DMatrix::<f64>::zeros(n, 1);
    backward_multifrontal_solve(&partitioned, &state, &mut x_partitioned);

    for i in 0..n {
        assert!(
            (x_baseline.get(i, 0) - x_partitioned.get(i, 0)).abs() < 1e-8,
            "row {i}: baseline {} vs partitioned {}",
            x_baseline.get(i, 0),
            x_partitioned.get(i, 0)
        );
    }
}
