//! Work-memory layout (§5a): computes each front's `p_wmem` offset once,
//! sequentially, so that sibling fronts' windows never overlap — the
//! "symbolic setup" the reference assumes has already run before
//! factorization begins. This crate's own solve/sample/extend-add paths
//! thread state as owned values instead (§4.7a), so `WorkMemory` is not
//! consulted by them; it is provided because §5 and §8 property 7 name it as
//! a first-class part of the concurrency model, for a caller that wants an
//! explicit offset table alongside the tree (e.g. to size a shared scratch
//! buffer ahead of time for a future non-owning solve variant).

use std::collections::HashMap;

use crate::front::Front;
use mfhss_core::Scalar;

/// Disjoint per-front windows into one shared scratch buffer, keyed by each
/// front's `sep_begin` (unique across the tree since separators partition the
/// global row range).
#[derive(Debug, Clone, Default)]
pub struct WorkMemory {
    offsets: HashMap<usize, usize>,
    total: usize,
}

impl WorkMemory {
    /// Walks the front tree once, assigning each front a window of
    /// `dim_upd` slots sized to its own update set (§5a).
    pub fn layout<T: Scalar>(root: &Front<T>) -> Self {
        let mut wmem = WorkMemory::default();
        wmem.layout_rec(root);
        wmem
    }

    fn layout_rec<T: Scalar>(&mut self, front: &Front<T>) {
        for child in &front.children {
            self.layout_rec(child);
        }
        let p_wmem = self.total;
        self.offsets.insert(front.sep_begin, p_wmem);
        self.total += front.dim_upd();
    }

    /// The offset assigned to the front whose separator begins at
    /// `sep_begin`, if laid out.
    pub fn p_wmem(&self, sep_begin: usize) -> Option<usize> {
        self.offsets.get(&sep_begin).copied()
    }

    /// Total scratch-buffer size required to hold every front's window.
    pub fn total_len(&self) -> usize {
        self.total
    }

    /// True iff the windows `[a_offset, a_offset + a_len)` and
    /// `[b_offset, b_offset + b_len)` are disjoint (§8 property 7).
    pub fn windows_disjoint(a_offset: usize, a_len: usize, b_offset: usize, b_len: usize) -> bool {
        a_offset + a_len <= b_offset || b_offset + b_len <= a_offset
    }
}
