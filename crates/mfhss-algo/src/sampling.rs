//! Randomized sampling driver (§4.4) and CB-sampling (§4.5): builds the
//! `(R, Sr, Sc)` triple a front's `compress` call needs, by combining the
//! sparse matrix's own direct action with every child's already-factored
//! Schur-complement action.

use mfhss_core::{DMatrix, DenseHss, Dub01, Scalar, SeedableRowRng, SparseFront};

use crate::front::SchurRepr;
use crate::index_map::upd_to_parent;

/// A read-only view of one already-factored child front, sufficient to
/// sample its CB action (§4.5).
pub struct ChildSampleCtx<'a, T: Scalar> {
    pub hss: &'a DenseHss<T>,
    pub schur: &'a SchurRepr<T>,
    pub phi: &'a DMatrix<T>,
    pub dub01: &'a Dub01<T>,
    pub sep_begin: usize,
    pub sep_end: usize,
    pub upd: &'a [usize],
}

/// Draws a fresh `d`-column random batch `R` (seeded per `(global_row,
/// column)` so the result is reproducible regardless of task scheduling,
/// §5 ordering guarantee iv), applies the sparse front's own direct action
/// via [`SparseFront::front_multiply`], then folds in every child's CB
/// contribution via [`sample_cb`] (§4.4).
#[allow(clippy::too_many_arguments)]
pub fn random_sampling<T: Scalar, R: SeedableRowRng>(
    rng: &mut R,
    a: &(impl SparseFront<T> + ?Sized),
    sep_begin: usize,
    sep_end: usize,
    upd: &[usize],
    d: usize,
    children: &[ChildSampleCtx<T>],
    indirect_sampling: bool,
) -> (DMatrix<T>, DMatrix<T>, DMatrix<T>) {
    let dim_sep = sep_end - sep_begin;
    let dim_blk = dim_sep + upd.len();
    let r = DMatrix::from_fn(dim_blk, d, |i, col| {
        let global_row = if i < dim_sep { sep_begin + i } else { upd[i - dim_sep] };
        rng.seed(global_row as u32, col as u32);
        T::from_f64(rng.get())
    });
    let mut sr = DMatrix::zeros(dim_blk, d);
    let mut sc = DMatrix::zeros(dim_blk, d);
    a.front_multiply(sep_begin, sep_end, upd, upd.len(), &r, &mut sr, &mut sc);

    for child in children {
        let (local, csr, csc) = sample_cb(child, sep_begin, sep_end, upd, &r, indirect_sampling);
        sr.scatter_rows_add(&local, &csr);
        sc.scatter_rows_add(&local, &csc);
    }
    (r, sr, sc)
}

/// Gathers the rows of the parent's own random batch `r_parent` that
/// correspond to one child's `upd` set, then either replays that child's
/// stored sampling history (indirect path) or recomputes its Schur action
/// directly (§4.5). Returns the parent-local row indices the result should
/// be scattered into, alongside the sampled `(cSr, cSc)`.
pub fn sample_cb<T: Scalar>(
    child: &ChildSampleCtx<T>,
    parent_sep_begin: usize,
    parent_sep_end: usize,
    parent_upd: &[usize],
    r_parent: &DMatrix<T>,
    indirect_sampling: bool,
) -> (Vec<usize>, DMatrix<T>, DMatrix<T>) {
    let local = upd_to_parent(child.upd, parent_sep_begin, parent_sep_end, parent_upd);
    let cr = r_parent.extract_rows(&local);
    let (csr, csc) = if indirect_sampling && child.hss.random_samples() > 0 {
        let mut csr = DMatrix::zeros(cr.rows(), cr.cols());
        let mut csc = DMatrix::zeros(cr.rows(), cr.cols());
        child.hss.schur_product_indirect(child.dub01, &cr, &mut csr, &mut csc);
        (csr, csc)
    } else {
        sample_cb_direct(child.hss, child.schur, child.phi, &cr)
    };
    (local, csr, csc)
}

/// Recomputes a child's Schur-complement action on `cr` directly from its
/// `Θ`/`Φ` factors, without consulting any stored history (§4.5
/// "sample_CB_direct").
pub fn sample_cb_direct<T: Scalar>(child_hss: &DenseHss<T>, schur: &SchurRepr<T>, phi: &DMatrix<T>, cr: &DMatrix<T>) -> (DMatrix<T>, DMatrix<T>) {
    let mut csr = DMatrix::zeros(cr.rows(), cr.cols());
    let mut csc = DMatrix::zeros(cr.rows(), cr.cols());
    child_hss.schur_product_direct(schur.inner(), phi, cr, &mut csr, &mut csc);
    (csr, csc)
}
