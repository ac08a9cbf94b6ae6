//! Extend-add (§4.2) and CB sub-matrix extraction (§4.3): the two ways a
//! child front's factored Schur complement feeds into its parent, either
//! scattered wholesale into the parent's dense block, or pulled out on
//! demand for arbitrary global row/column queries (used by the parent's own
//! `elem` oracle during compression, §4.6 step 3).

use mfhss_core::{DMatrix, DenseHss, Scalar};

use crate::index_map::{find_local_indices, upd_to_parent};

/// The parent's four dense sub-blocks (F11/F12/F21/F22), modeled as one
/// `dim_blk × dim_blk` backing buffer split at `dim_sep` (§4.2a).
pub struct DenseParentBlocks<T: Scalar> {
    block: DMatrix<T>,
    dim_sep: usize,
    dim_upd: usize,
}

impl<T: Scalar> DenseParentBlocks<T> {
    pub fn new(dim_sep: usize, dim_upd: usize) -> Self {
        DenseParentBlocks {
            block: DMatrix::zeros(dim_sep + dim_upd, dim_sep + dim_upd),
            dim_sep,
            dim_upd,
        }
    }

    pub fn dim_sep(&self) -> usize {
        self.dim_sep
    }

    pub fn dim_upd(&self) -> usize {
        self.dim_upd
    }

    pub fn f11(&self) -> DMatrix<T> {
        let idx: Vec<usize> = (0..self.dim_sep).collect();
        self.block.extract(&idx, &idx)
    }

    pub fn f22(&self) -> DMatrix<T> {
        let idx: Vec<usize> = (self.dim_sep..self.dim_sep + self.dim_upd).collect();
        self.block.extract(&idx, &idx)
    }

    /// Arbitrary local-index sub-block query (used by the parent's own
    /// `elem` oracle).
    pub fn elem(&self, li: &[usize], lj: &[usize]) -> DMatrix<T> {
        self.block.extract(li, lj)
    }

    pub fn add_entries(&mut self, li: &[usize], lj: &[usize], values: &DMatrix<T>) {
        self.block.scatter_add(li, lj, values);
    }
}

/// Scatters a child's factored Schur complement into the parent's dense
/// block at the positions its `upd` set occupies in the parent's own
/// `[sep_begin, sep_end) ∪ upd` ordering (§4.2 "extend-add").
pub fn extend_add_to_dense<T: Scalar>(
    parent: &mut DenseParentBlocks<T>,
    parent_sep_begin: usize,
    parent_sep_end: usize,
    parent_upd: &[usize],
    child_upd: &[usize],
    child_schur: &DMatrix<T>,
) {
    if child_upd.is_empty() {
        return;
    }
    let local = upd_to_parent(child_upd, parent_sep_begin, parent_sep_end, parent_upd);
    parent.add_entries(&local, &local, child_schur);
}

/// Pulls the sub-block of a child's trailing Schur complement at arbitrary
/// global row/column subsets of its own `upd` set (§4.3
/// "extract_CB_sub_matrix").
pub fn extract_cb_sub_matrix<T: Scalar>(
    child_hss: &DenseHss<T>,
    child_sep_begin: usize,
    child_sep_end: usize,
    child_upd: &[usize],
    global_i: &[usize],
    global_j: &[usize],
) -> DMatrix<T> {
    let dim_sep = child_sep_end - child_sep_begin;
    let li: Vec<usize> = find_local_indices(global_i, child_sep_begin, child_sep_end, child_upd)
        .into_iter()
        .map(|l| l - dim_sep)
        .collect();
    let lj: Vec<usize> = find_local_indices(global_j, child_sep_begin, child_sep_end, child_upd)
        .into_iter()
        .map(|l| l - dim_sep)
        .collect();
    child_hss.extract(&li, &lj)
}

/// A read-only view of one child front sufficient to locate and extract its
/// CB contribution, used by [`add_children_cb_into`].
pub struct ChildCbView<'a, T: Scalar> {
    pub hss: &'a DenseHss<T>,
    pub sep_begin: usize,
    pub sep_end: usize,
    pub upd: &'a [usize],
}

/// Adds every child's CB contribution into `b`, for arbitrary global
/// row/column queries `global_i`/`global_j` restricted to the rows/columns
/// that actually fall within that child's own `upd` set (used as the `elem`
/// oracle during compression, §4.6 step 3).
pub fn add_children_cb_into<T: Scalar>(b: &mut DMatrix<T>, global_i: &[usize], global_j: &[usize], children: &[ChildCbView<T>]) {
    for child in children {
        if child.upd.is_empty() {
            continue;
        }
        let mut rows_global = Vec::new();
        let mut rows_out = Vec::new();
        for (oi, &g) in global_i.iter().enumerate() {
            if child.upd.binary_search(&g).is_ok() {
                rows_global.push(g);
                rows_out.push(oi);
            }
        }
        let mut cols_global = Vec::new();
        let mut cols_out = Vec::new();
        for (oj, &g) in global_j.iter().enumerate() {
            if child.upd.binary_search(&g).is_ok() {
                cols_global.push(g);
                cols_out.push(oj);
            }
        }
        if rows_global.is_empty() || cols_global.is_empty() {
            continue;
        }
        let sub = extract_cb_sub_matrix(child.hss, child.sep_begin, child.sep_end, child.upd, &rows_global, &cols_global);
        b.scatter_add(&rows_out, &cols_out, &sub);
    }
}
