use crate::{Collective, CollectiveResult, Payload, ReduceOp};

/// Collective of a single process: every reduction and broadcast is the identity.
///
/// Used when an ensemble has one instance. Operation names are still validated so that code
/// written against [`crate::GridCollective`] fails the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullCollective;

impl Collective for NullCollective {
    #[inline]
    fn name(&self) -> &'static str {
        "NullCollective"
    }

    #[inline(always)]
    fn size(&self) -> usize {
        1
    }

    #[inline(always)]
    fn rank(&self) -> usize {
        0
    }

    #[inline]
    fn all_reduce(&self, v: Payload, _op: ReduceOp) -> CollectiveResult<Payload> {
        Ok(v)
    }

    #[inline]
    fn bcast(&self, v: Payload, _root: usize) -> CollectiveResult<Payload> {
        Ok(v)
    }
}
