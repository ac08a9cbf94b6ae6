//! Errors surfaced by the HSS front and its dense/HSS-kernel façades.

use thiserror::Error;

/// Errors from HSS front construction, compression, factorization and solve.
#[derive(Debug, Error)]
pub enum HssError {
    #[error("partition tree size {tree_size} does not match separator size {dim_sep}")]
    PartitionSizeMismatch { tree_size: usize, dim_sep: usize },

    #[error("cannot bipartition a graph part with {0} vertices (need at least 2)")]
    PartitionTooSmall(usize),

    #[error("singular pivot (|pivot| = {0:e}) encountered during dense elimination")]
    SingularPivot(f64),
}

/// Convenience alias used throughout `mfhss-core` and `mfhss-algo`.
pub type Result<T> = std::result::Result<T, HssError>;
