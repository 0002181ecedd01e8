use std::f64::consts::PI;

use clap::Parser;
use collective::{
    check_mesh_consistent_partitioning, split_communicators, Collective, CollectiveResult,
    GridCollective, IntervalMesh, NullCollective, Payload, ReduceOp,
};
use comm_engine::{root_info, CommEngine};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct EnsembleGridArgs {
    /// Number of subdomains every mesh is partitioned into
    #[arg(short = 's', long, default_value_t = 1)]
    pub n_subdomain: usize,

    /// Number of ensemble instances
    #[arg(short = 'i', long, default_value_t = 1)]
    pub n_instance: usize,

    /// Cells of the sample mesh of [0, 1]
    #[arg(short, long, default_value_t = 64)]
    pub cells: usize,

    /// Reject fields partitioned over more than one process (needs --n-subdomain 1)
    #[arg(long)]
    pub serial_check: bool,

    /// Simulate the ranks with threads of this process, even in an MPI build
    #[arg(short, long)]
    pub threads: bool,
}

/// Ensemble statistics of the sample field
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleStats {
    /// Instances counted through the collective
    pub n_instance: i64,
    /// Discrete l2 norm of the nodal values of the ensemble mean
    pub mean_norm_l2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleReport {
    pub consistent: bool,
    /// Only computed when the partitioning is consistent
    pub stats: Option<EnsembleStats>,
}

/// Build the process grid over `world`, verify that every instance partitions the sample mesh the
/// same way and average a sample field over the ensemble.
///
/// Instance `k` holds `(k + 1) sin(pi x)` on the vertices of the mesh. Collective over `world`.
pub fn run<C: CommEngine + 'static>(
    world: &C,
    args: &EnsembleGridArgs,
) -> CollectiveResult<EnsembleReport> {
    let split = split_communicators(world, args.n_subdomain, args.n_instance)?;
    let instance = split.grid.address(world.rank()).key;
    root_info!(
        world,
        "process grid: {} subdomain(s) x {} instance(s) on {} process(es)",
        args.n_subdomain,
        args.n_instance,
        world.size()
    );

    let collective: Box<dyn Collective> = if args.n_instance == 1 {
        Box::new(NullCollective)
    } else {
        Box::new(GridCollective::with_serial_check(
            split.collective,
            args.serial_check,
        ))
    };
    root_info!(world, "collective: {}", collective.name());

    let mesh = IntervalMesh::new(split.mesh, args.cells)?;
    let consistent = check_mesh_consistent_partitioning(&mesh, collective.as_ref(), world)?;
    root_info!(world, "partitioning consistent across instances: {consistent}");
    if !consistent {
        return Ok(EnsembleReport {
            consistent,
            stats: None,
        });
    }

    let n_instance = collective
        .all_reduce(Payload::Int(1), ReduceOp::Sum)?
        .as_int()
        .expect("collectives preserve the payload kind");

    let amplitude = (instance + 1) as f64;
    let sample = mesh
        .vertex_space()
        .interpolate(|x| amplitude * (PI * x).sin());
    let mean = collective
        .all_reduce(Payload::field(sample), ReduceOp::Avg)?
        .into_field()
        .expect("collectives preserve the payload kind");

    let local_squares = mean.local().iter().map(|v| v * v).sum::<f64>();
    let mean_norm_l2 = mesh.comm().all_reduce_sum_f64(&[local_squares])[0].sqrt();
    root_info!(
        world,
        "ensemble of {n_instance}: l2 norm of the mean field {mean_norm_l2:.6}"
    );

    Ok(EnsembleReport {
        consistent,
        stats: Some(EnsembleStats {
            n_instance,
            mean_norm_l2,
        }),
    })
}
