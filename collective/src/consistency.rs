use comm_engine::CommEngine;
use itertools::izip;

use crate::{
    Collective, CollectiveError, CollectiveResult, DistributedVector, FunctionSpace,
    IntervalMesh, Payload,
};

const TOLERANCE: f64 = 1e-10;

/// Check that every instance of the ensemble partitions `space` the same way.
///
/// Each process fingerprints its partition with a field equal to its mesh-group rank, the
/// collective root broadcasts its fingerprint, and every process compares it with its own. A
/// process whose local size differs from the root's fails the check. The outcome is and-reduced
/// over `world`, so the returned value is the same on every process.
///
/// Collective over `world`.
pub fn check_space_consistent_partitioning<S, K, C>(
    space: &S,
    collective: &K,
    world: &C,
) -> CollectiveResult<bool>
where
    S: FunctionSpace,
    K: Collective + ?Sized,
    C: CommEngine,
{
    let fingerprint = space.partition_rank() as f64;
    let own = space.interpolate_constant(fingerprint);
    let root_fingerprint = if collective.rank() == 0 {
        space.interpolate_constant(fingerprint)
    } else {
        space.interpolate_constant(0.0)
    };

    let passed_here = match collective.bcast(Payload::field(root_fingerprint), 0) {
        Ok(received) => received
            .into_field()
            .is_some_and(|root| local_distance(&own, &*root) < TOLERANCE),
        Err(CollectiveError::LocalSizeMismatch { expected, found }) => {
            log::warn!(
                "rank {} holds {expected} local dofs, the collective root holds {found}",
                world.rank()
            );
            false
        }
        Err(e) => return Err(e),
    };

    let passed_everywhere = world.all_reduce_and(passed_here);
    log::debug!(
        "rank {}: partition consistent here: {passed_here}, everywhere: {passed_everywhere}",
        world.rank()
    );
    Ok(passed_everywhere)
}

/// Run [`check_space_consistent_partitioning`] for the cell space and for the vertex space of
/// `mesh`.
pub fn check_mesh_consistent_partitioning<K, C>(
    mesh: &IntervalMesh<C>,
    collective: &K,
    world: &C,
) -> CollectiveResult<bool>
where
    K: Collective + ?Sized,
    C: CommEngine + 'static,
{
    let cells = check_space_consistent_partitioning(&mesh.cell_space(), collective, world)?;
    let vertices = check_space_consistent_partitioning(&mesh.vertex_space(), collective, world)?;
    Ok(cells && vertices)
}

fn local_distance(a: &dyn DistributedVector, b: &dyn DistributedVector) -> f64 {
    if a.local().len() != b.local().len() {
        return f64::INFINITY;
    }
    izip!(a.local(), b.local())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
