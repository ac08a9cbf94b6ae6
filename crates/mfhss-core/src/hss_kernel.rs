//! HSS kernel contract (§6 "HSS kernel") and its one in-crate realization,
//! `DenseHss<T>` (§6a). The front logic above this module (in the companion
//! `mfhss-algo` crate) is written entirely against the methods below; a
//! future hierarchical, rank-truncating compressor could replace the body of
//! this module without the front logic changing.
//!
//! `DenseHss` represents `H` as one dense `dim_blk × dim_blk` block. Its
//! `compress` does one exact `elem` pass instead of iterative randomized rank
//! discovery (§6a), so every quantity below is exact rather than
//! tolerance-bounded; `Schur_update`'s branch predicate (`cols(Θ) < cols(Φ)`)
//! always resolves to the "else" branch because `Θ` and `Φ` always carry the
//! same (`dim_sep`) column count here.

use crate::dense::{gemm, DMatrix, Trans};
use crate::error::{HssError, Result};
use crate::options::HssOptions;
use crate::partition::HssPartitionTree;
use crate::scalar::Scalar;

/// `A11⁻¹ · A12`, cached so `backward_solve` need not re-solve against the
/// LU factors on every call (the reference's `_DUB01` field, §6).
#[derive(Debug, Clone)]
pub struct Dub01<T: Scalar>(DMatrix<T>);

impl<T: Scalar> Dub01<T> {
    /// The cached `A11⁻¹` this bundle wraps.
    pub fn a11_inv(&self) -> &DMatrix<T> {
        &self.0
    }
}

/// Partial-pivoting LU of `A11` plus the `Vhat` basis (`= I` here), returned
/// by [`DenseHss::partial_factor`]/[`DenseHss::factor`].
#[derive(Debug, Clone)]
pub struct Ulv<T: Scalar> {
    lu: DMatrix<T>,
    piv: Vec<usize>,
    vhat: DMatrix<T>,
}

impl<T: Scalar> Ulv<T> {
    /// `Vhat` basis used when forming `ΘVhatᴴ`/`VhatᴴΦᴴ` (§4.6 step 4b).
    pub fn vhat(&self) -> &DMatrix<T> {
        &self.vhat
    }

    pub fn nonzeros(&self) -> usize {
        self.lu.rows() * self.lu.cols()
    }

    /// Solve `A11 · x = rhs` (any number of right-hand-side columns) against
    /// the stored LU factors.
    pub fn solve(&self, rhs: &DMatrix<T>) -> DMatrix<T> {
        lu_solve(&self.lu, &self.piv, rhs)
    }
}

fn lu_decompose<T: Scalar>(a: &DMatrix<T>) -> Result<(DMatrix<T>, Vec<usize>)> {
    let n = a.rows();
    debug_assert_eq!(n, a.cols(), "lu_decompose requires a square block");
    let mut lu = a.clone();
    let mut piv: Vec<usize> = (0..n).collect();
    for k in 0..n {
        let mut p = k;
        let mut best = lu.get(k, k).norm();
        for i in (k + 1)..n {
            let v = lu.get(i, k).norm();
            if v > best {
                best = v;
                p = i;
            }
        }
        if best < 1e-14 {
            return Err(HssError::SingularPivot(best));
        }
        if p != k {
            for j in 0..n {
                let tmp = lu.get(k, j);
                lu.set(k, j, lu.get(p, j));
                lu.set(p, j, tmp);
            }
            piv.swap(k, p);
        }
        let pivot = lu.get(k, k);
        for i in (k + 1)..n {
            let factor = lu.get(i, k) * pivot.recip();
            lu.set(i, k, factor);
            for j in (k + 1)..n {
                let v = lu.get(i, j) - factor * lu.get(k, j);
                lu.set(i, j, v);
            }
        }
    }
    Ok((lu, piv))
}

/// Solves `A·x = rhs` given the combined LU storage and pivot permutation
/// produced by [`lu_decompose`], for any number of right-hand-side columns.
fn lu_solve<T: Scalar>(lu: &DMatrix<T>, piv: &[usize], rhs: &DMatrix<T>) -> DMatrix<T> {
    let n = lu.rows();
    debug_assert_eq!(rhs.rows(), n);
    let nrhs = rhs.cols();
    let mut x = DMatrix::from_fn(n, nrhs, |i, j| rhs.get(piv[i], j));
    // forward substitution, unit-lower L stored below the diagonal of `lu`
    for j in 0..nrhs {
        for i in 0..n {
            let mut acc = x.get(i, j);
            for k in 0..i {
                acc -= lu.get(i, k) * x.get(k, j);
            }
            x.set(i, j, acc);
        }
        // back substitution against upper-triangular U (diagonal included)
        for i in (0..n).rev() {
            let mut acc = x.get(i, j);
            for k in (i + 1)..n {
                acc -= lu.get(i, k) * x.get(k, j);
            }
            x.set(i, j, acc * lu.get(i, i).recip());
        }
    }
    x
}

/// Invert an `n x n` block by solving against its own identity, column by
/// column, via [`lu_decompose`]/[`lu_solve`] (§6a: "hand-written
/// Doolittle-with-partial-pivoting").
fn invert<T: Scalar>(a: &DMatrix<T>) -> Result<DMatrix<T>> {
    let n = a.rows();
    let (lu, piv) = lu_decompose(a)?;
    Ok(lu_solve(&lu, &piv, &DMatrix::identity(n)))
}

/// Forms `ΘVhatCorVhatCΦC` from the branch predicate of §3/§4.6 step 4b.
/// Kept general (rather than hard-coded to the always-false predicate that
/// `DenseHss` happens to produce) so the formula matches the reference
/// exactly and would still be correct for a future rank-truncating kernel
/// where `Θ` and `Φ` can carry different column counts.
pub fn form_theta_vhat_cor<T: Scalar>(theta: &DMatrix<T>, vhat: &DMatrix<T>, phi: &DMatrix<T>) -> DMatrix<T> {
    if theta.cols() < phi.cols() {
        let mut out = DMatrix::zeros(vhat.cols(), phi.rows());
        gemm(Trans::C, Trans::C, T::one(), vhat, phi, T::zero(), &mut out);
        out
    } else {
        let mut out = DMatrix::zeros(theta.rows(), vhat.rows());
        gemm(Trans::N, Trans::C, T::one(), theta, vhat, T::zero(), &mut out);
        out
    }
}

/// One node's dense-equivalent HSS representation (§6a).
#[derive(Debug, Clone)]
pub struct DenseHss<T: Scalar> {
    partition: HssPartitionTree,
    dim_sep: usize,
    dim_upd: usize,
    h: DMatrix<T>,
    r1: DMatrix<T>,
    sr2: DMatrix<T>,
    sc2: DMatrix<T>,
    trailing: Option<DMatrix<T>>,
    task_depth: usize,
}

impl<T: Scalar> DenseHss<T> {
    pub fn new(partition: HssPartitionTree, dim_sep: usize, dim_upd: usize) -> Self {
        debug_assert_eq!(partition.size, dim_sep + dim_upd);
        let dim_blk = dim_sep + dim_upd;
        DenseHss {
            partition,
            dim_sep,
            dim_upd,
            h: DMatrix::zeros(dim_blk, dim_blk),
            r1: DMatrix::zeros(0, 0),
            sr2: DMatrix::zeros(0, 0),
            sc2: DMatrix::zeros(0, 0),
            trailing: None,
            task_depth: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.dim_sep + self.dim_upd
    }

    pub fn cols(&self) -> usize {
        self.dim_sep + self.dim_upd
    }

    /// Always `dim_upd`: a dense-equivalent block carries no rank
    /// truncation, so its "rank" is the full size of the off-diagonal
    /// coupling (§8 S4: "ranks agree trivially since `DenseHss` is always
    /// full rank").
    pub fn rank(&self) -> usize {
        self.dim_upd
    }

    pub fn nonzeros(&self) -> usize {
        self.h.rows() * self.h.cols()
    }

    pub fn set_task_depth(&mut self, depth: usize) {
        self.task_depth = depth;
    }

    /// The partition tree this block was constructed over (§6
    /// `HSSPartitionTree`); read back by `set_HSS_partitioning` callers to
    /// confirm the installed skeleton (§8 S6).
    pub fn partition(&self) -> &HssPartitionTree {
        &self.partition
    }

    /// `H.child(1).dense()` (§6): the current trailing (update) block. `None`
    /// until [`DenseHss::schur_update`] has run.
    pub fn dense(&self) -> Option<&DMatrix<T>> {
        self.trailing.as_ref()
    }

    /// `H.child(1).extract(I, J)` (§6): a local-index sub-block of the
    /// trailing block.
    pub fn extract(&self, li: &[usize], lj: &[usize]) -> DMatrix<T> {
        let s = self.trailing.as_ref().expect("extract requires a completed Schur update");
        s.extract(li, lj)
    }

    fn a12(&self) -> DMatrix<T> {
        let rows: Vec<usize> = (0..self.dim_sep).collect();
        let cols: Vec<usize> = (self.dim_sep..self.dim_sep + self.dim_upd).collect();
        self.h.extract(&rows, &cols)
    }

    fn a22(&self) -> DMatrix<T> {
        let idx: Vec<usize> = (self.dim_sep..self.dim_sep + self.dim_upd).collect();
        self.h.extract(&idx, &idx)
    }

    /// Populates `H` via the `mult`/`elem` oracles (§4.6 step 3/4, §6a).
    /// `mult(d)` must return `(R, Sr, Sc)` with `R` the `d`-column random
    /// batch it drew and `Sr := A_front·R`, `Sc := A_frontᴴ·R` (already
    /// including any child CB contribution, per §4.4/§4.5); `elem(I, J)`
    /// must return `A_front[I, J]`.
    pub fn compress(
        &mut self,
        mut mult: impl FnMut(usize) -> (DMatrix<T>, DMatrix<T>, DMatrix<T>),
        mut elem: impl FnMut(&[usize], &[usize]) -> DMatrix<T>,
        opts: &HssOptions,
    ) {
        let (r, sr, sc) = mult(opts.d0);
        self.r1 = r;
        self.sr2 = sr;
        self.sc2 = sc;
        let all: Vec<usize> = (0..self.rows()).collect();
        self.h = elem(&all, &all);
    }

    /// Eliminates the leading `dim_sep × dim_sep` block of `H` via
    /// partial-pivoting LU, returning the ULV bundle plus `(Θ, Dub01, Φ)`
    /// (§6a: `Θ = A21·A11⁻¹`, `Φ = A12ᴴ`, `Vhat = I`).
    pub fn partial_factor(&mut self) -> Result<(Ulv<T>, DMatrix<T>, Dub01<T>, DMatrix<T>)> {
        if self.dim_upd == 0 {
            let (ulv, _, _, _) = self.factor_inner(0)?;
            return Ok((ulv, DMatrix::zeros(0, self.dim_sep), Dub01(DMatrix::zeros(0, 0)), DMatrix::zeros(0, self.dim_sep)));
        }
        self.factor_inner(self.dim_upd)
    }

    /// Full elimination of the whole block (root case, §4.6 step 4a).
    pub fn factor(&mut self) -> Result<Ulv<T>> {
        let (ulv, _, _, _) = self.factor_inner(0)?;
        Ok(ulv)
    }

    fn factor_inner(&self, dim_upd: usize) -> Result<(Ulv<T>, DMatrix<T>, Dub01<T>, DMatrix<T>)> {
        let a11 = self.h.extract(&(0..self.dim_sep).collect::<Vec<_>>(), &(0..self.dim_sep).collect::<Vec<_>>());
        let (lu, piv) = lu_decompose(&a11)?;
        let vhat = DMatrix::identity(self.dim_sep);
        let ulv = Ulv { lu: lu.clone(), piv: piv.clone(), vhat };
        if dim_upd == 0 || self.dim_upd == 0 {
            return Ok((ulv, DMatrix::zeros(0, self.dim_sep), Dub01(DMatrix::zeros(0, 0)), DMatrix::zeros(0, self.dim_sep)));
        }
        let a11_inv = lu_solve(&lu, &piv, &DMatrix::identity(self.dim_sep));
        let a21 = self.h.extract(
            &(self.dim_sep..self.dim_sep + self.dim_upd).collect::<Vec<_>>(),
            &(0..self.dim_sep).collect::<Vec<_>>(),
        );
        let a12 = self.a12();
        let mut theta = DMatrix::zeros(self.dim_upd, self.dim_sep);
        gemm(Trans::N, Trans::N, T::one(), &a21, &a11_inv, T::zero(), &mut theta);
        let phi = a12.conj_transpose();
        Ok((ulv, theta, Dub01(a11_inv), phi))
    }

    /// `S := A22 − Θ·ΦH` and (if this front compressed with a nonempty
    /// random-vector history) refreshes `R1`/`Sr2`/`Sc2` to the
    /// Schur-corrected action restricted to the `upd` rows, so that
    /// [`DenseHss::schur_product_indirect`] can replay them exactly (§4.5,
    /// §6a).
    pub fn schur_update(&mut self, theta: &DMatrix<T>, phi: &DMatrix<T>) {
        if self.dim_upd == 0 {
            self.trailing = None;
            return;
        }
        let mut s = self.a22();
        gemm(Trans::N, Trans::C, -T::one(), theta, phi, T::one(), &mut s);
        if !self.r1.is_empty() {
            let upd_rows: Vec<usize> = (self.dim_sep..self.dim_sep + self.dim_upd).collect();
            let r1_upd = self.r1.extract_rows(&upd_rows);
            let mut sr2 = DMatrix::zeros(self.dim_upd, r1_upd.cols());
            let mut sc2 = DMatrix::zeros(self.dim_upd, r1_upd.cols());
            gemm(Trans::N, Trans::N, T::one(), &s, &r1_upd, T::zero(), &mut sr2);
            gemm(Trans::C, Trans::N, T::one(), &s, &r1_upd, T::zero(), &mut sc2);
            self.r1 = r1_upd;
            self.sr2 = sr2;
            self.sc2 = sc2;
        }
        self.trailing = Some(s);
    }

    /// `cSr := S·cR`, `cSc := Sᴴ·cR`, recomputing `S = A22 − ΘΦᴴ` directly
    /// from `Θ`/`Φ` rather than relying on a cached trailing block (§6
    /// `Schur_product_direct`).
    pub fn schur_product_direct(&self, theta_vhat_cor: &DMatrix<T>, phi: &DMatrix<T>, cr: &DMatrix<T>, csr: &mut DMatrix<T>, csc: &mut DMatrix<T>) {
        let mut s = self.a22();
        gemm(Trans::N, Trans::C, -T::one(), theta_vhat_cor, phi, T::one(), &mut s);
        gemm(Trans::N, Trans::N, T::one(), &s, cr, T::zero(), csr);
        gemm(Trans::C, Trans::N, T::one(), &s, cr, T::zero(), csc);
    }

    /// Replays the stored `(R1, Sr2, Sc2)` history instead of recomputing
    /// `S·cR` (§6 `Schur_product_indirect`); valid only when `cr` is exactly
    /// the replayed prefix of `R1` that `schur_update` already folded in.
    /// `dub01` is the `A11⁻¹` bundle `partial_factor` returned alongside the
    /// `Θ`/`Φ` that produced this history; its presence here (rather than
    /// just `R1`/`Sr2`/`Sc2`) ties the replay to the exact partial ULV it
    /// was cached against (§8 property 5).
    pub fn schur_product_indirect(&self, dub01: &Dub01<T>, cr: &DMatrix<T>, csr: &mut DMatrix<T>, csc: &mut DMatrix<T>) {
        debug_assert_eq!(cr.rows(), self.r1.rows());
        debug_assert_eq!(cr.cols(), self.sr2.cols(), "indirect replay requires column-identical history");
        debug_assert_eq!(
            dub01.a11_inv().rows(),
            self.dim_sep,
            "DUB01 must come from this same front's partial_factor"
        );
        *csr = self.sr2.clone();
        *csc = self.sc2.clone();
    }

    /// Random-vector history width currently retained (used to size the next
    /// round's sample batch, §4.4 step 2).
    pub fn random_samples(&self) -> usize {
        self.r1.cols()
    }

    /// Releases the dense block and trailing Schur complement (§3 invariant
    /// 5: work memory is released once factorization of a front completes).
    pub fn delete_trailing_block(&mut self) {
        self.trailing = None;
        self.h.clear();
    }

    /// Reduces `rhs` (this front's own separator slice) via the cached LU of
    /// `A11`, returning the reduced right-hand side when `keep_reduced_rhs`
    /// is set (§4.7 "forward_multifrontal_solve").
    pub fn forward_solve(&self, ulv: &Ulv<T>, rhs: &mut DMatrix<T>, keep_reduced_rhs: bool) -> DMatrix<T> {
        let z = ulv.solve(rhs);
        rhs.copy_block(z.rows(), z.cols(), &z, 0, 0, 0, 0);
        if keep_reduced_rhs {
            z
        } else {
            DMatrix::zeros(0, 0)
        }
    }

    /// Applies the `x1 = reduced_rhs − (A11⁻¹A12)·x2` correction (§4.8
    /// "backward_multifrontal_solve"); `x2_correction` is the parent's
    /// already-solved update-set values at this front's `upd` rows, `None`
    /// at the root (`dim_upd == 0`). `ulv` is the same bundle returned by
    /// [`DenseHss::partial_factor`]/[`DenseHss::factor`] for this front.
    pub fn backward_solve(&self, ulv: &Ulv<T>, reduced_rhs: &DMatrix<T>, x2_correction: Option<&DMatrix<T>>, rhs: &mut DMatrix<T>) {
        let mut x1 = reduced_rhs.clone();
        if let Some(x2) = x2_correction {
            if self.dim_upd > 0 {
                let a12 = self.a12();
                let y = ulv.solve(&a12); // A11⁻¹·A12
                gemm(Trans::N, Trans::N, -T::one(), &y, x2, T::one(), &mut x1);
            }
        }
        rhs.copy_block(x1.rows(), x1.cols(), &x1, 0, 0, 0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::HssPartitionTree;

    /// 4x4 SPD block split into a 2x2 separator and a 2x2 update set.
    fn sample_block() -> DMatrix<f64> {
        DMatrix::from_fn(4, 4, |i, j| {
            let a = [
                [4.0, 1.0, 0.5, 0.0],
                [1.0, 3.0, 0.0, 0.5],
                [0.5, 0.0, 2.0, 0.2],
                [0.0, 0.5, 0.2, 2.5],
            ];
            a[i][j]
        })
    }

    #[test]
    fn partial_factor_reconstructs_exact_schur_complement() {
        let mut h = DenseHss::<f64>::new(HssPartitionTree::leaf(4), 2, 2);
        h.compress(
            |_d| (DMatrix::zeros(4, 0), DMatrix::zeros(4, 0), DMatrix::zeros(4, 0)),
            |i, j| sample_block().extract(i, j),
            &HssOptions::default().with_leaf_size(2),
        );
        let (_ulv, theta, _dub01, phi) = h.partial_factor().unwrap();
        h.schur_update(&theta, &phi);

        // hand-computed Schur complement A22 - A21*A11^-1*A12 for sample_block()
        let a = sample_block();
        let a11 = a.extract(&[0, 1], &[0, 1]);
        let a12 = a.extract(&[0, 1], &[2, 3]);
        let a21 = a.extract(&[2, 3], &[0, 1]);
        let a22 = a.extract(&[2, 3], &[2, 3]);
        let a11_inv = invert(&a11).unwrap();
        let mut correction = DMatrix::<f64>::zeros(2, 2);
        gemm(Trans::N, Trans::N, 1.0, &a21, &a11_inv, 0.0, &mut correction);
        let mut expected = a22.clone();
        gemm(Trans::N, Trans::N, -1.0, &correction, &a12, 1.0, &mut expected);

        let got = h.dense().unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert!((got.get(i, j) - expected.get(i, j)).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn round_trip_solve_matches_direct_solve() {
        let a = sample_block();
        let mut h = DenseHss::<f64>::new(HssPartitionTree::leaf(4), 2, 2);
        h.compress(
            |_d| (DMatrix::zeros(4, 0), DMatrix::zeros(4, 0), DMatrix::zeros(4, 0)),
            |i, j| a.extract(i, j),
            &HssOptions::default(),
        );
        let (ulv, theta, _dub01, phi) = h.partial_factor().unwrap();
        h.schur_update(&theta, &phi);

        // solve the trailing 2x2 system directly for x2
        let s = h.dense().unwrap().clone();
        let b = DMatrix::<f64>::from_fn(4, 1, |i, _| (i + 1) as f64);
        let b1 = b.extract(&[0, 1], &[0]);
        let b2 = b.extract(&[2, 3], &[0]);
        let mut rhs1 = b1.clone();
        let reduced = h.forward_solve(&ulv, &mut rhs1, true);
        let mut tmp = b2.clone();
        gemm(Trans::N, Trans::N, -1.0, &theta, &reduced, 1.0, &mut tmp);
        let (s_lu, s_piv) = lu_decompose(&s).unwrap();
        let x2 = lu_solve(&s_lu, &s_piv, &tmp);
        let mut x1 = b1.clone();
        h.backward_solve(&ulv, &reduced, Some(&x2), &mut x1);

        let x = DMatrix::<f64>::from_fn(4, 1, |i, _| if i < 2 { x1.get(i, 0) } else { x2.get(i - 2, 0) });
        let mut residual = DMatrix::<f64>::zeros(4, 1);
        gemm(Trans::N, Trans::N, 1.0, &a, &x, 0.0, &mut residual);
        for i in 0..4 {
            assert!((residual.get(i, 0) - b.get(i, 0)).abs() < 1e-9);
        }
    }
}
