//! Factorization orchestrator (§4.6): recursive post-order traversal of the
//! elimination tree, compressing each front via randomized sampling and
//! exact element extraction, then eliminating its separator via partial (or,
//! at the root, full) ULV factorization.

use mfhss_core::{DMatrix, HssOptions, Result, Scalar, SparseFront, SplitMixRng};

use crate::extend_add::{add_children_cb_into, ChildCbView};
use crate::front::{Front, SchurRepr};
use crate::sampling::{random_sampling, ChildSampleCtx};

/// Factorizes every front of the tree rooted at `front` (§4.6). Runs
/// correctly whether called from a plain thread or from inside an existing
/// `rayon::scope`/thread pool (§5).
pub fn multifrontal_factorization<T: Scalar>(front: &mut Front<T>, a: &(impl SparseFront<T> + Sync), opts: &HssOptions) -> Result<()> {
    factorize_rec(front, a, opts, 0)
}

fn factorize_rec<T: Scalar>(front: &mut Front<T>, a: &(impl SparseFront<T> + Sync), opts: &HssOptions, depth: usize) -> Result<()> {
    if front.children.len() == 2 && depth < opts.cutoff_depth {
        let (left, rest) = front.children.split_at_mut(1);
        let (r0, r1) = rayon::join(|| factorize_rec(&mut left[0], a, opts, depth + 1), || factorize_rec(&mut rest[0], a, opts, depth + 1));
        r0?;
        r1?;
    } else {
        for child in front.children.iter_mut() {
            factorize_rec(child, a, opts, depth + 1)?;
        }
    }

    let dim_sep = front.dim_sep();
    let sep_begin = front.sep_begin;
    let sep_end = front.sep_end;
    let upd = front.upd.clone();

    let child_max = front.children.iter().map(|c| c.hss.random_samples()).max().unwrap_or(0);
    let mut local_opts = opts.clone();
    local_opts.d0 = child_max.saturating_sub(opts.dd).max(opts.d0);

    let mut rng = SplitMixRng::new(opts.random_distribution);
    let children = &front.children;

    let mult = |d: usize| -> (DMatrix<T>, DMatrix<T>, DMatrix<T>) {
        let ctx: Vec<ChildSampleCtx<T>> = children
            .iter()
            .map(|c| ChildSampleCtx {
                hss: &c.hss,
                schur: &c.schur,
                phi: &c.phi,
                dub01: c.dub01.as_ref().expect("child front must be factorized before its parent samples it"),
                sep_begin: c.sep_begin,
                sep_end: c.sep_end,
                upd: &c.upd,
            })
            .collect();
        random_sampling(&mut rng, a, sep_begin, sep_end, &upd, d, &ctx, opts.indirect_sampling)
    };

    let elem = |gi: &[usize], gj: &[usize]| -> DMatrix<T> {
        let local_to_global = |l: usize| if l < dim_sep { sep_begin + l } else { upd[l - dim_sep] };
        let global_i: Vec<usize> = gi.iter().map(|&l| local_to_global(l)).collect();
        let global_j: Vec<usize> = gj.iter().map(|&l| local_to_global(l)).collect();
        let mut b = DMatrix::zeros(gi.len(), gj.len());
        a.extract_separator(sep_end, &global_i, &global_j, &mut b);
        let views: Vec<ChildCbView<T>> = children
            .iter()
            .map(|c| ChildCbView {
                hss: &c.hss,
                sep_begin: c.sep_begin,
                sep_end: c.sep_end,
                upd: &c.upd,
            })
            .collect();
        add_children_cb_into(&mut b, &global_i, &global_j, &views);
        b
    };

    front.hss.compress(mult, elem, &local_opts);

    if front.is_root() {
        let ulv = front.hss.factor()?;
        front.ulv = Some(ulv);
    } else {
        let (ulv, theta, dub01, phi) = front.hss.partial_factor()?;
        front.hss.schur_update(&theta, &phi);
        front.schur = SchurRepr::from_branch(&theta, ulv.vhat(), &phi);
        front.theta = theta;
        front.phi = phi;
        front.dub01 = Some(dub01);
        front.ulv = Some(ulv);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mfhss_core::star_graph;

    #[test]
    fn factorizes_a_two_leaf_tree_without_error() {
        // Star graph with 2 leaves: center is node 2, a valid two-level
        // elimination tree (each leaf's only neighbor is the center).
        let a = star_graph(2);
        let mut root = Front::<f64>::new(2, 3, vec![], vec![Front::leaf(0, 1, vec![2]), Front::leaf(1, 2, vec![2])]);
        let opts = HssOptions::default().with_leaf_size(8);
        multifrontal_factorization(&mut root, &a, &opts).unwrap();
        assert!(root.ulv.is_some());
        assert!(root.children[0].ulv.is_some());
        assert!(root.children[1].ulv.is_some());
    }
}
