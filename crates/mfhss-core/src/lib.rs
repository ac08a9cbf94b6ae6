//! Scalar, dense-block, sparse-matrix, HSS-kernel and RNG contracts shared by
//! the multifrontal HSS front logic in the companion `mfhss-algo` crate.
//!
//! This crate has no notion of an elimination tree, a front, or a
//! factorization order — it only provides the small set of external
//! collaborators a front is built against (§6 of the design notes): a
//! generic scalar, a column-major dense block with BLAS-3-shaped ops, a CSR
//! sparse matrix, a seedable-per-coordinate RNG, an HSS partition tree, and
//! one concrete (dense-equivalent) HSS kernel realization.

pub mod dense;
pub mod error;
pub mod hss_kernel;
pub mod options;
pub mod partition;
pub mod rng;
pub mod scalar;
pub mod sparse;

pub use dense::{gemm, DMatrix, Trans};
pub use error::{HssError, Result};
pub use hss_kernel::{form_theta_vhat_cor, DenseHss, Dub01, Ulv};
pub use options::HssOptions;
pub use partition::HssPartitionTree;
pub use rng::{RandomDistribution, RandomEngine, SeedableRowRng, SplitMixRng};
pub use scalar::Scalar;
pub use sparse::{laplacian_1d, star_graph, CsrMatrix, SparseFront};
