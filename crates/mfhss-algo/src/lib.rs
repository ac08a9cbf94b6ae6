//! Front-level algorithms of the multifrontal HSS solver: the elimination
//! tree node ([`Front`]), index mapping between a child's update set and its
//! parent's block, extend-add/CB extraction, randomized sampling, the
//! factorization orchestrator, forward/backward triangular solve, separator
//! repartitioning, and work-memory layout. Built against the `mfhss-core`
//! contracts (`Scalar`, `DMatrix`, `SparseFront`, `DenseHss`) so this crate
//! carries no HSS arithmetic of its own.

pub mod extend_add;
pub mod factorize;
pub mod front;
pub mod index_map;
pub mod partitioning;
pub mod sampling;
pub mod solve;
pub mod wmem;

pub use extend_add::{add_children_cb_into, extend_add_to_dense, extract_cb_sub_matrix, ChildCbView, DenseParentBlocks};
pub use factorize::multifrontal_factorization;
pub use front::{Front, SchurRepr};
pub use index_map::{find_local_indices, local_index, upd_to_parent};
pub use partitioning::{bisection_partitioning, extract_separator, sep_tree_to_partition, split_separator, GraphPartitioner, SepTree, SpectralBisection};
pub use sampling::{random_sampling, sample_cb, sample_cb_direct, ChildSampleCtx};
pub use solve::{backward_multifrontal_solve, forward_multifrontal_solve, ForwardState};
pub use wmem::WorkMemory;
