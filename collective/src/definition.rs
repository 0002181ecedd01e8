use crate::{CollectiveResult, Payload, ReduceOp};

/// Reductions and broadcasts across the instances of an ensemble
pub trait Collective {
    /// Name used in error messages
    fn name(&self) -> &'static str;

    /// Number of processes in the collective
    fn size(&self) -> usize;

    /// Rank of the calling process within the collective
    fn rank(&self) -> usize;

    /// Reduce `v` over the collective; every process gets the same result back
    fn all_reduce(&self, v: Payload, op: ReduceOp) -> CollectiveResult<Payload>;

    /// Same as [`Collective::all_reduce`] with the operation given by name (`"sum"` or `"avg"`,
    /// case-insensitive). Unknown names are rejected before anything is communicated.
    fn all_reduce_named(&self, v: Payload, op: &str) -> CollectiveResult<Payload> {
        let op = op.parse::<ReduceOp>()?;
        self.all_reduce(v, op)
    }

    /// Replace `v` on every process with the value held by `root`
    fn bcast(&self, v: Payload, root: usize) -> CollectiveResult<Payload>;
}
