use std::fmt::Debug;

/// Message-passing APIs used by the collectives.
///
/// Every method except `size`, `rank` and the helpers derived from them is a
/// blocking collective call: all processes of the group must invoke it, in the
/// same order, with matching buffer lengths. There is no timeout; a process
/// that skips a call hangs its whole group.
pub trait CommEngine: Clone + Debug {
    const ROOT_RANK: usize = 0;

    /// Number of processes in the group
    fn size(&self) -> usize;

    /// Rank of the calling process within the group
    fn rank(&self) -> usize;

    #[inline(always)]
    /// Check if the calling process is the root of the group
    fn is_root(&self) -> bool {
        self.rank() == Self::ROOT_RANK
    }

    #[inline(always)]
    /// Check if there is only one process in the group
    fn is_single_process(&self) -> bool {
        self.size() == 1
    }

    /// Split the group. Processes passing the same `color` end up in the same new group,
    /// ranked by `(key, rank in self)`.
    fn split(&self, color: usize, key: usize) -> Self;

    /// Elementwise sum of `local` over the group; every process receives the result
    fn all_reduce_sum_f64(&self, local: &[f64]) -> Vec<f64>;

    /// Overwrite `buf` with its elementwise sum over the group
    fn all_reduce_sum_f64_in_place(&self, buf: &mut [f64]) {
        let sum = self.all_reduce_sum_f64(buf);
        buf.copy_from_slice(&sum);
    }

    /// Elementwise sum of `local` over the group, wrapping on overflow; every process receives
    /// the result
    fn all_reduce_sum_i64(&self, local: &[i64]) -> Vec<i64>;

    /// Logical and of `local` over the group
    fn all_reduce_and(&self, local: bool) -> bool;

    /// Replace `buf` on every process with the one held by `root`.
    /// Non-root buffers are resized to the root's length.
    fn broadcast_f64(&self, buf: &mut Vec<f64>, root: usize);

    /// Replace `buf` on every process with the one held by `root`.
    /// Non-root buffers are resized to the root's length.
    fn broadcast_i64(&self, buf: &mut Vec<i64>, root: usize);

    /// Gather the (possibly differently sized) local vectors of all processes, in rank order
    fn all_gather_f64(&self, local: &[f64]) -> Vec<Vec<f64>>;

    /// Barrier for all the processes in the group
    fn barrier(&self);
}
