//! Mapping a front's own rows, or another front's update-set rows, into
//! local indices of a `[sep_begin, sep_end) ∪ upd` block (§4.1).

/// Local index of `global` within `[sep_begin, sep_end) ∪ upd`, or `None` if
/// `global` belongs to neither range.
pub fn local_index(global: usize, sep_begin: usize, sep_end: usize, upd: &[usize]) -> Option<usize> {
    if global >= sep_begin && global < sep_end {
        return Some(global - sep_begin);
    }
    let dim_sep = sep_end - sep_begin;
    upd.binary_search(&global).ok().map(|pos| dim_sep + pos)
}

/// Maps every entry of `globals` through [`local_index`]. Every caller in
/// this crate only ever queries indices it already knows belong to the
/// block, so a miss is a programming error, not a recoverable condition.
pub fn find_local_indices(globals: &[usize], sep_begin: usize, sep_end: usize, upd: &[usize]) -> Vec<usize> {
    globals
        .iter()
        .map(|&g| {
            let li = local_index(g, sep_begin, sep_end, upd);
            debug_assert!(li.is_some(), "global index {g} does not belong to this front's block");
            li.unwrap_or(0)
        })
        .collect()
}

/// A child's `upd` set expressed as local indices within the parent's own
/// `[sep_begin, sep_end) ∪ upd` block (§4.1 `upd_to_parent`).
pub fn upd_to_parent(child_upd: &[usize], parent_sep_begin: usize, parent_sep_end: usize, parent_upd: &[usize]) -> Vec<usize> {
    find_local_indices(child_upd, parent_sep_begin, parent_sep_end, parent_upd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_separator_and_update_rows() {
        let upd = [10usize, 20, 30];
        assert_eq!(local_index(5, 3, 8, &upd), Some(2));
        assert_eq!(local_index(20, 3, 8, &upd), Some(5 + 1));
        assert_eq!(local_index(99, 3, 8, &upd), None);
    }

    #[test]
    fn upd_to_parent_preserves_order() {
        let parent_upd = [4usize, 9, 15, 22];
        let child_upd = [9usize, 22];
        let mapped = upd_to_parent(&child_upd, 0, 4, &parent_upd);
        // dim_sep = 4, so parent_upd[0]=4 -> local 4, [1]=9 -> local 5, ...
        assert_eq!(mapped, vec![5, 7]);
    }
}
