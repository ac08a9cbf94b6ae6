//! Sparse matrix contract (§6 "Sparse matrix") plus one concrete CSR
//! realization used by tests and example trees. This is deliberately not a
//! general sparse linear algebra library — reordering, symbolic
//! factorization and format conversions are explicit Non-goals (§1).

use crate::dense::{gemm, DMatrix, Trans};
use crate::scalar::Scalar;

/// The external sparse-matrix contract a front is built against.
pub trait SparseFront<T: Scalar> {
    /// Number of rows/columns of the global matrix.
    fn size(&self) -> usize;
    /// CSR row-start offsets, length `size() + 1`.
    fn get_ptr(&self) -> &[usize];
    /// CSR column indices, length `get_ptr()[size()]`.
    fn get_ind(&self) -> &[usize];

    /// `Sr := A_front * R`, `Sc := A_front^H * R`, where `A_front` is the
    /// restriction of `A` to this front's own `[sep_begin, sep_end) ∪ upd`
    /// index set, excluding entries whose row *and* column both land in the
    /// `upd` portion (those are deferred to the ancestor that owns them, so
    /// they are not double counted — see [`SparseFront::extract_separator`]).
    fn front_multiply(
        &self,
        sep_begin: usize,
        sep_end: usize,
        upd: &[usize],
        dim_upd: usize,
        r: &DMatrix<T>,
        sr: &mut DMatrix<T>,
        sc: &mut DMatrix<T>,
    );

    /// Write `A[gI, gJ]` into `b`, skipping entries with both row and column
    /// `>= sep_end` (§6: "avoids double-counting trailing sub-blocks").
    fn extract_separator(&self, sep_end: usize, g_i: &[usize], g_j: &[usize], b: &mut DMatrix<T>);
}

/// Plain CSR sparse matrix, built once from triplets (duplicates summed).
#[derive(Debug, Clone)]
pub struct CsrMatrix<T: Scalar> {
    n: usize,
    ptr: Vec<usize>,
    ind: Vec<usize>,
    val: Vec<T>,
}

impl<T: Scalar> CsrMatrix<T> {
    pub fn from_triplets(n: usize, triplets: &[(usize, usize, T)]) -> Self {
        let mut rows: Vec<Vec<(usize, T)>> = vec![Vec::new(); n];
        for &(i, j, v) in triplets {
            debug_assert!(i < n && j < n);
            rows[i].push((j, v));
        }
        let mut ptr = Vec::with_capacity(n + 1);
        let mut ind = Vec::new();
        let mut val = Vec::new();
        ptr.push(0);
        for row in rows.iter_mut() {
            row.sort_by_key(|(j, _)| *j);
            let mut merged: Vec<(usize, T)> = Vec::with_capacity(row.len());
            for &(j, v) in row.iter() {
                if let Some(last) = merged.last_mut() {
                    if last.0 == j {
                        last.1 += v;
                        continue;
                    }
                }
                merged.push((j, v));
            }
            for (j, v) in merged {
                ind.push(j);
                val.push(v);
            }
            ptr.push(ind.len());
        }
        CsrMatrix { n, ptr, ind, val }
    }

    pub fn get(&self, i: usize, j: usize) -> T {
        let row = self.ptr[i]..self.ptr[i + 1];
        for k in row {
            if self.ind[k] == j {
                return self.val[k];
            }
        }
        T::zero()
    }

    /// Global index `l`-th local index of this front maps to (local < dim_sep
    /// maps into the separator range, else into `upd`).
    fn local_to_global(local: usize, sep_begin: usize, dim_sep: usize, upd: &[usize]) -> usize {
        if local < dim_sep {
            sep_begin + local
        } else {
            upd[local - dim_sep]
        }
    }
}

impl<T: Scalar> SparseFront<T> for CsrMatrix<T> {
    fn size(&self) -> usize {
        self.n
    }

    fn get_ptr(&self) -> &[usize] {
        &self.ptr
    }

    fn get_ind(&self) -> &[usize] {
        &self.ind
    }

    fn front_multiply(
        &self,
        sep_begin: usize,
        sep_end: usize,
        upd: &[usize],
        dim_upd: usize,
        r: &DMatrix<T>,
        sr: &mut DMatrix<T>,
        sc: &mut DMatrix<T>,
    ) {
        let dim_sep = sep_end - sep_begin;
        let dim_blk = dim_sep + dim_upd;
        debug_assert_eq!(r.rows(), dim_blk);
        let mut a_front = DMatrix::<T>::zeros(dim_blk, dim_blk);
        for li in 0..dim_blk {
            let gi = Self::local_to_global(li, sep_begin, dim_sep, upd);
            for lj in 0..dim_blk {
                if li >= dim_sep && lj >= dim_sep {
                    continue; // deferred to the ancestor that owns this upd×upd pair
                }
                let gj = Self::local_to_global(lj, sep_begin, dim_sep, upd);
                let v = self.get(gi, gj);
                if v != T::zero() {
                    a_front.set(li, lj, v);
                }
            }
        }
        gemm(Trans::N, Trans::N, T::one(), &a_front, r, T::zero(), sr);
        gemm(Trans::C, Trans::N, T::one(), &a_front, r, T::zero(), sc);
    }

    fn extract_separator(&self, sep_end: usize, g_i: &[usize], g_j: &[usize], b: &mut DMatrix<T>) {
        debug_assert_eq!(b.rows(), g_i.len());
        debug_assert_eq!(b.cols(), g_j.len());
        for (oj, &gj) in g_j.iter().enumerate() {
            for (oi, &gi) in g_i.iter().enumerate() {
                if gi >= sep_end && gj >= sep_end {
                    continue;
                }
                let v = self.get(gi, gj);
                if v != T::zero() {
                    b.add_at(oi, oj, v);
                }
            }
        }
    }
}

/// Builds the CSR matrix for a 1-D Laplacian (tridiagonal, `2` on the
/// diagonal, `-1` off-diagonal) of size `n`, used by the S2/S6 end-to-end
/// scenarios (§8).
pub fn laplacian_1d(n: usize) -> CsrMatrix<f64> {
    let mut triplets = Vec::with_capacity(3 * n);
    for i in 0..n {
        triplets.push((i, i, 2.0));
        if i > 0 {
            triplets.push((i, i - 1, -1.0));
        }
        if i + 1 < n {
            triplets.push((i, i + 1, -1.0));
        }
    }
    CsrMatrix::from_triplets(n, &triplets)
}

/// Builds a star graph: `n_leaves` outer nodes (indices `0..n_leaves`) each
/// connected only to one shared center node (index `n_leaves`), diagonally
/// dominant so the system is well-conditioned. Unlike [`laplacian_1d`], every
/// leaf-to-leaf pair is disconnected, so a two-level elimination tree (one
/// front per leaf, root = the center) exactly matches the graph's true
/// connectivity with no multi-hop `upd` propagation — useful for exercising
/// extend-add/CB-sampling end to end without a deeper nested-dissection tree.
pub fn star_graph(n_leaves: usize) -> CsrMatrix<f64> {
    let center = n_leaves;
    let n = n_leaves + 1;
    let mut triplets = Vec::with_capacity(3 * n_leaves + 1);
    triplets.push((center, center, 2.0 * n_leaves as f64));
    for leaf in 0..n_leaves {
        triplets.push((leaf, leaf, 3.0));
        triplets.push((leaf, center, -1.0));
        triplets.push((center, leaf, -1.0));
    }
    CsrMatrix::from_triplets(n, &triplets)
}
