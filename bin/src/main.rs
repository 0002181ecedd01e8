use bin::driver::{run, EnsembleGridArgs};
use clap::Parser;
use collective::{CollectiveError, CollectiveResult};
use comm_engine::ThreadComm;

fn launch_threads(args: &EnsembleGridArgs) -> CollectiveResult<()> {
    let world_size = args
        .n_subdomain
        .checked_mul(args.n_instance)
        .filter(|&n| n > 0)
        .ok_or(CollectiveError::Configuration {
            world_size: 0,
            n_subdomain: args.n_subdomain,
            n_instance: args.n_instance,
        })?;

    ThreadComm::launch(world_size, |world| run(&world, args))?
        .into_iter()
        .collect::<CollectiveResult<Vec<_>>>()?;
    Ok(())
}

#[cfg(feature = "mpi")]
fn launch(args: &EnsembleGridArgs) -> CollectiveResult<()> {
    use comm_engine::MPIComm;

    if args.threads {
        return launch_threads(args);
    }
    let universe = MPIComm::init()?;
    let world = MPIComm::world(&universe);
    run(&world, args)?;
    Ok(())
}

#[cfg(not(feature = "mpi"))]
fn launch(args: &EnsembleGridArgs) -> CollectiveResult<()> {
    launch_threads(args)
}

fn main() -> CollectiveResult<()> {
    // e.g.
    // ensemble-grid --n-subdomain 2 --n-instance 4 --cells 128 --threads
    // mpiexec -n 8 ensemble-grid --n-subdomain 2 --n-instance 4 (built with --features mpi)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = EnsembleGridArgs::parse();
    launch(&args)
}
