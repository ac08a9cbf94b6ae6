//! One elimination-tree node (§3 Data Model): its separator/update-set
//! bookkeeping, its HSS representation, and the Schur-complement factors it
//! hands up to its parent once factored.

use mfhss_core::{form_theta_vhat_cor, DMatrix, DenseHss, Dub01, HssError, HssPartitionTree, Result, Scalar, Ulv};

/// Which side of the branch predicate (`cols(Θ) < cols(Φ)`) produced a
/// front's `ΘVhatCorVhatCΦC` term (§3, §8 property 2). `DenseHss` always
/// produces `RightPhi` since `Θ` and `Φ` carry the same column count, but
/// every consumer dispatches on the variant rather than assuming one,
/// keeping the two Schur-complement representations interchangeable.
#[derive(Debug, Clone)]
pub enum SchurRepr<T: Scalar> {
    /// `S = F22 − Θ · repr`
    LeftTheta(DMatrix<T>),
    /// `S = F22 − repr · Φᴴ`
    RightPhi(DMatrix<T>),
}

impl<T: Scalar> SchurRepr<T> {
    pub fn from_branch(theta: &DMatrix<T>, vhat: &DMatrix<T>, phi: &DMatrix<T>) -> Self {
        let cor = form_theta_vhat_cor(theta, vhat, phi);
        if theta.cols() < phi.cols() {
            SchurRepr::LeftTheta(cor)
        } else {
            SchurRepr::RightPhi(cor)
        }
    }

    pub fn inner(&self) -> &DMatrix<T> {
        match self {
            SchurRepr::LeftTheta(m) | SchurRepr::RightPhi(m) => m,
        }
    }
}

/// One node of the elimination tree. Leaves have no children; internal
/// fronts have exactly two (the binary elimination trees this crate builds,
/// §4.9).
pub struct Front<T: Scalar> {
    pub sep_begin: usize,
    pub sep_end: usize,
    pub upd: Vec<usize>,
    pub children: Vec<Front<T>>,
    pub hss: DenseHss<T>,
    pub ulv: Option<Ulv<T>>,
    pub theta: DMatrix<T>,
    pub phi: DMatrix<T>,
    pub schur: SchurRepr<T>,
    pub dub01: Option<Dub01<T>>,
}

impl<T: Scalar> Front<T> {
    pub fn new(sep_begin: usize, sep_end: usize, mut upd: Vec<usize>, children: Vec<Front<T>>) -> Self {
        upd.sort_unstable();
        let dim_sep = sep_end - sep_begin;
        let dim_upd = upd.len();
        let partition = HssPartitionTree::leaf(dim_sep + dim_upd);
        Front {
            sep_begin,
            sep_end,
            upd,
            children,
            hss: DenseHss::new(partition, dim_sep, dim_upd),
            ulv: None,
            theta: DMatrix::zeros(0, 0),
            phi: DMatrix::zeros(0, 0),
            schur: SchurRepr::RightPhi(DMatrix::zeros(0, 0)),
            dub01: None,
        }
    }

    pub fn leaf(sep_begin: usize, sep_end: usize, upd: Vec<usize>) -> Self {
        Front::new(sep_begin, sep_end, upd, Vec::new())
    }

    pub fn dim_sep(&self) -> usize {
        self.sep_end - self.sep_begin
    }

    pub fn dim_upd(&self) -> usize {
        self.upd.len()
    }

    /// The root of the elimination tree is the unique front with an empty
    /// update set (§3, §4.6 step 4a).
    pub fn is_root(&self) -> bool {
        self.upd.is_empty()
    }

    /// Installs a caller-provided HSS partitioning (§4.9
    /// `set_HSS_partitioning`): for the root, `H` is built directly over
    /// `sep_tree`; otherwise `H` is built over a two-child tree whose left
    /// subtree is `sep_tree` and whose right subtree is a `leaf_size`-refined
    /// chain of length `dim_upd`. Must be called before `compress` (it
    /// rebuilds the HSS block from scratch, discarding any prior state).
    ///
    /// Fails with [`HssError::PartitionSizeMismatch`] if `sep_tree` does not
    /// cover exactly this front's separator (§7: a malformed partition tree
    /// is a fatal, surfaced condition, not an assertion reserved for debug
    /// builds).
    pub fn set_hss_partitioning(&mut self, sep_tree: &crate::partitioning::SepTree, leaf_size: usize) -> Result<()> {
        let dim_sep = self.dim_sep();
        let dim_upd = self.dim_upd();
        if sep_tree.size != dim_sep {
            return Err(HssError::PartitionSizeMismatch {
                tree_size: sep_tree.size,
                dim_sep,
            });
        }
        let sep_part = crate::partitioning::sep_tree_to_partition(sep_tree);
        let partition = if self.is_root() {
            sep_part
        } else {
            let mut upd_chain = HssPartitionTree::leaf(dim_upd);
            upd_chain.refine(leaf_size);
            HssPartitionTree::with_children(dim_sep + dim_upd, vec![sep_part, upd_chain])
        };
        self.hss = DenseHss::new(partition, dim_sep, dim_upd);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_upd_and_sizes_the_hss_block() {
        let f = Front::<f64>::leaf(4, 6, vec![9, 2, 5]);
        assert_eq!(f.upd, vec![2, 5, 9]);
        assert_eq!(f.dim_sep(), 2);
        assert_eq!(f.dim_upd(), 3);
        assert_eq!(f.hss.rows(), 5);
    }

    #[test]
    fn root_has_empty_update_set() {
        let root = Front::<f64>::new(0, 4, vec![], vec![Front::leaf(4, 6, vec![0, 1]), Front::leaf(6, 8, vec![0, 1])]);
        assert!(root.is_root());
    }

    #[test]
    fn set_hss_partitioning_mirrors_sep_tree_on_left_and_refines_upd_on_right() {
        // S6: non-root front with dim_sep=4, dim_upd=6, leaf_size=2.
        let mut f = Front::<f64>::leaf(0, 4, vec![10, 11, 12, 13, 14, 15]);
        // 6-node path graph 0-1-2-3-4-5; separator is the first 4 rows, with
        // `separator_ordering_level = 1` pulling in neighbor 4.
        let ptr = [0, 1, 3, 5, 7, 9, 10];
        let ind = [1, 0, 2, 1, 3, 2, 4, 3, 5, 4];
        let sep_tree = crate::partitioning::split_separator(&ptr, &ind, &[0, 1, 2, 3], 1, 1, &crate::partitioning::SpectralBisection).unwrap();
        f.set_hss_partitioning(&sep_tree, 2).unwrap();
        let installed = f.hss.partition();
        assert_eq!(installed.children.len(), 2);
        assert_eq!(installed.children[0], crate::partitioning::sep_tree_to_partition(&sep_tree));
        let right = &installed.children[1];
        assert_eq!(right.size, 6);
        fn max_leaf(t: &mfhss_core::HssPartitionTree) -> usize {
            if t.is_leaf() {
                t.size
            } else {
                t.children.iter().map(max_leaf).max().unwrap()
            }
        }
        assert!(max_leaf(right) <= 2);
    }

    #[test]
    fn set_hss_partitioning_rejects_a_sep_tree_of_the_wrong_size() {
        let mut f = Front::<f64>::leaf(0, 4, vec![10, 11]);
        let wrong_size_tree = crate::partitioning::SepTree { size: 3, children: Vec::new() };
        let err = f.set_hss_partitioning(&wrong_size_tree, 2).unwrap_err();
        assert!(matches!(err, HssError::PartitionSizeMismatch { tree_size: 3, dim_sep: 4 }));
    }
}
