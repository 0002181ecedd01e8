//! This crate defines the message-passing substrate used by the ensemble collectives
//!
//! - Comm Engine: the group operations the collectives are built on (split, all-reduce,
//!   broadcast, all-gather, barrier)
//! - Thread Comm: ranks simulated by the threads of a single process
//! - MPI Comm: ranks as MPI processes (`mpi` feature)

mod definition;
pub use definition::CommEngine;

mod errors;
pub use errors::{CommError, CommResult};

mod thread_comm;
pub use thread_comm::ThreadComm;

#[cfg(feature = "mpi")]
mod mpi_comm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MPIComm;

/// Log at info level, on the root rank of the given group only
#[macro_export]
macro_rules! root_info {
    ($comm: expr, $($arg:tt)*) => {
        if $crate::CommEngine::is_root($comm) {
            log::info!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests;
