//! Separator repartitioning (§4.9/§4.9a): the graph-partitioner contract that
//! stands in for the external nested-dissection tool, a working
//! `SpectralBisection` default built on `petgraph` (mirroring `gat-core`'s own
//! use of `petgraph::Graph` + BFS traversal for component/island analysis),
//! and `split_separator`/`extract_separator` as independently-testable
//! building blocks that the default `bisection_partitioning` path does not
//! call, matching the reference's own inert stub.

use std::collections::VecDeque;

use petgraph::graph::UnGraph;

use mfhss_core::{HssError, HssPartitionTree};

/// Bipartitions a CSR-described graph into two roughly balanced parts,
/// returning one bit per vertex (`true` = part 1). Stands in for the external
/// nested-dissection tool (METIS in the reference), §4.9a.
pub trait GraphPartitioner {
    fn bipartition(&self, xadj: &[usize], adjncy: &[usize]) -> Result<Vec<bool>, HssError>;
}

/// A real, working (if not METIS-quality) bipartition: orders vertices by a
/// breadth-first sweep from an arbitrary source and splits the BFS order in
/// half. Reordering quality metrics are an explicit Non-goal (§1); this gives
/// every vertex a part assignment without modeling edge-cut optimality.
pub struct SpectralBisection;

impl GraphPartitioner for SpectralBisection {
    fn bipartition(&self, xadj: &[usize], adjncy: &[usize]) -> Result<Vec<bool>, HssError> {
        let n = xadj.len().saturating_sub(1);
        if n < 2 {
            return Err(HssError::PartitionTooSmall(n));
        }
        let mut graph = UnGraph::<(), ()>::with_capacity(n, adjncy.len());
        let nodes: Vec<_> = (0..n).map(|_| graph.add_node(())).collect();
        for u in 0..n {
            for &v in &adjncy[xadj[u]..xadj[u + 1]] {
                if v > u {
                    graph.add_edge(nodes[u], nodes[v], ());
                }
            }
        }

        let mut order = Vec::with_capacity(n);
        let mut visited = vec![false; n];
        for start in 0..n {
            if visited[start] {
                continue;
            }
            let mut queue = VecDeque::new();
            queue.push_back(start);
            visited[start] = true;
            while let Some(u) = queue.pop_front() {
                order.push(u);
                for neighbor in graph.neighbors(nodes[u]) {
                    let v = neighbor.index();
                    if !visited[v] {
                        visited[v] = true;
                        queue.push_back(v);
                    }
                }
            }
        }

        let half = order.len() / 2;
        let mut part = vec![false; n];
        for &v in &order[half..] {
            part[v] = true;
        }
        Ok(part)
    }
}

/// Extracts the induced subgraph (CSR adjacency) over a strictly increasing
/// row subset `rows` of the global sparse matrix described by `(ptr, ind)`,
/// optionally extending to include one hop of neighbors when
/// `separator_ordering_level == 1` (§4.9 `split_separator`). Returns the
/// `(xadj, adjncy)` pair alongside `members`, the sorted global row id for
/// each vertex of that subgraph (`rows` plus any pulled-in neighbors) — a
/// caller that only cares about the original `rows` must look its rows up in
/// `members` rather than assume `members[0..rows.len()] == rows`, since
/// pulled-in neighbors can sort anywhere among them.
pub fn extract_separator(ptr: &[usize], ind: &[usize], rows: &[usize], separator_ordering_level: u8) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut members: Vec<usize> = rows.to_vec();
    if separator_ordering_level == 1 {
        let mut extra = Vec::new();
        for &r in rows {
            for &c in &ind[ptr[r]..ptr[r + 1]] {
                if rows.binary_search(&c).is_err() {
                    extra.push(c);
                }
            }
        }
        members.extend(extra);
        members.sort_unstable();
        members.dedup();
    }

    let mut xadj = Vec::with_capacity(members.len() + 1);
    let mut adjncy = Vec::new();
    xadj.push(0);
    for (self_pos, &r) in members.iter().enumerate() {
        for &c in &ind[ptr[r]..ptr[r + 1]] {
            if let Ok(pos) = members.binary_search(&c) {
                if pos != self_pos {
                    adjncy.push(pos);
                }
            }
        }
        xadj.push(adjncy.len());
    }
    (xadj, adjncy, members)
}

/// A binary tree over a separator's local row indices, produced by recursive
/// bisection (§4.9 `split_separator`); each node's `size` equals the count of
/// rows in its part, leaves at or below `leaf_size`.
#[derive(Debug, Clone)]
pub struct SepTree {
    pub size: usize,
    pub children: Vec<SepTree>,
}

impl SepTree {
    fn leaf(size: usize) -> Self {
        SepTree { size, children: Vec::new() }
    }
}

/// Converts a [`SepTree`] into an [`HssPartitionTree`] of identical shape
/// (§4.9 `set_HSS_partitioning`: the sep_tree becomes the left subtree of the
/// installed HSS partition).
pub fn sep_tree_to_partition(t: &SepTree) -> HssPartitionTree {
    if t.children.is_empty() {
        HssPartitionTree::leaf(t.size)
    } else {
        HssPartitionTree::with_children(t.size, t.children.iter().map(sep_tree_to_partition).collect())
    }
}

/// Recursively bipartitions a separator's induced subgraph via `partitioner`,
/// descending into any part whose size is at least `2 * leaf_size` (§4.9).
/// This is a real, working implementation; it is an opt-in building block
/// that the default `bisection_partitioning` path below does not call,
/// matching the reference's own inert default (§9 design note).
pub fn split_separator(
    ptr: &[usize],
    ind: &[usize],
    rows: &[usize],
    leaf_size: usize,
    separator_ordering_level: u8,
    partitioner: &impl GraphPartitioner,
) -> Result<SepTree, HssError> {
    if rows.len() < 2 * leaf_size {
        return Ok(SepTree::leaf(rows.len()));
    }
    let (xadj, adjncy, members) = extract_separator(ptr, ind, rows, separator_ordering_level);
    let part = partitioner.bipartition(&xadj, &adjncy)?;
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &r in rows {
        let pos = members.binary_search(&r).expect("a separator row is always a member of its own induced subgraph");
        if part[pos] {
            right.push(r);
        } else {
            left.push(r);
        }
    }
    if left.is_empty() || right.is_empty() {
        return Ok(SepTree::leaf(rows.len()));
    }
    let left_tree = split_separator(ptr, ind, &left, leaf_size, separator_ordering_level, partitioner)?;
    let right_tree = split_separator(ptr, ind, &right, leaf_size, separator_ordering_level, partitioner)?;
    Ok(SepTree {
        size: rows.len(),
        children: vec![left_tree, right_tree],
    })
}

/// The reference's own documented stub (§4.9, §9): assigns every separator
/// row a negated-index placeholder ordering and builds a uniform refinement
/// of a flat `sep_tree` of size `dim_sep`, without ever calling
/// [`split_separator`]. Carried over unchanged so the default code path's
/// observable behavior matches the reference exactly.
pub fn bisection_partitioning(dim_sep: usize, leaf_size: usize) -> (Vec<i64>, SepTree) {
    let sorder: Vec<i64> = (0..dim_sep).map(|i| -(i as i64)).collect();
    let tree = uniform_refine(dim_sep, leaf_size);
    (sorder, tree)
}

fn uniform_refine(size: usize, leaf_size: usize) -> SepTree {
    if size <= leaf_size || size < 2 {
        return SepTree::leaf(size);
    }
    let left_size = size / 2;
    let right_size = size - left_size;
    SepTree {
        size,
        children: vec![uniform_refine(left_size, leaf_size), uniform_refine(right_size, leaf_size)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectral_bisection_splits_a_path_graph_in_half() {
        // path 0-1-2-3-4-5, CSR adjacency
        let ptr = vec![0, 1, 3, 5, 7, 9, 10];
        let ind = vec![1, 0, 2, 1, 3, 2, 4, 3, 5, 4];
        let part = SpectralBisection.bipartition(&ptr, &ind).unwrap();
        assert_eq!(part.len(), 6);
        let true_count = part.iter().filter(|&&b| b).count();
        assert!(true_count > 0 && true_count < 6);
    }

    #[test]
    fn bipartition_rejects_tiny_graphs() {
        let err = SpectralBisection.bipartition(&[0, 0], &[]).unwrap_err();
        assert!(matches!(err, HssError::PartitionTooSmall(1)));
    }

    #[test]
    fn bisection_partitioning_stub_never_calls_split_separator() {
        let (sorder, tree) = bisection_partitioning(6, 2);
        assert_eq!(sorder, vec![0, -1, -2, -3, -4, -5]);
        assert_eq!(tree.size, 6);
        assert_eq!(tree.children.len(), 2);
    }

    #[test]
    fn split_separator_descends_on_large_parts() {
        let ptr = vec![0, 1, 3, 5, 7, 9, 10];
        let ind = vec![1, 0, 2, 1, 3, 2, 4, 3, 5, 4];
        let rows = vec![0, 1, 2, 3, 4, 5];
        let tree = split_separator(&ptr, &ind, &rows, 1, 0, &SpectralBisection).unwrap();
        assert_eq!(tree.size, 6);
        assert_eq!(tree.children.len(), 2);
    }
}
