//! MPI implementation of [`CommEngine`].
//!
//! Requires the `mpi` feature flag and an MPI installation. The caller owns the MPI
//! environment; it is finalized when the [`Universe`] returned by [`MPIComm::init`] is dropped.

use std::{fmt::Debug, rc::Rc};

use mpi::{
    collective::SystemOperation,
    datatype::PartitionMut,
    environment::Universe,
    topology::{Color, SimpleCommunicator},
    traits::*,
    Count,
};

use crate::{CommEngine, CommError, CommResult};

#[derive(Clone)]
pub struct MPIComm {
    pub world_size: usize,
    pub world_rank: usize,
    comm: Rc<SimpleCommunicator>,
}

impl Debug for MPIComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MPIComm")
            .field("world_size", &self.world_size)
            .field("world_rank", &self.world_rank)
            .finish()
    }
}

impl MPIComm {
    // OK only once per process, mpi::initialize() returns None afterwards
    pub fn init() -> CommResult<Universe> {
        mpi::initialize().ok_or(CommError::MPIInit)
    }

    pub fn world(universe: &Universe) -> Self {
        Self::from_communicator(universe.world())
    }

    pub fn from_communicator(comm: SimpleCommunicator) -> Self {
        Self {
            world_size: comm.size() as usize,
            world_rank: comm.rank() as usize,
            comm: Rc::new(comm),
        }
    }

    /// Root broadcasts its length first so that the other buffers can be resized
    fn broadcast_vec<T: Equivalence + Copy + Default>(&self, buf: &mut Vec<T>, root: usize) {
        let root_process = self.comm.process_at_rank(root as i32);

        let mut len = buf.len() as u64;
        root_process.broadcast_into(&mut len);
        if self.world_rank != root {
            buf.resize(len as usize, T::default());
        }
        root_process.broadcast_into(&mut buf[..]);
    }
}

impl CommEngine for MPIComm {
    #[inline(always)]
    fn size(&self) -> usize {
        self.world_size
    }

    #[inline(always)]
    fn rank(&self) -> usize {
        self.world_rank
    }

    fn split(&self, color: usize, key: usize) -> Self {
        let comm = self
            .comm
            .split_by_color_with_key(Color::with_value(color as i32), key as i32)
            .expect("a process passing a defined color always joins a new communicator");
        Self::from_communicator(comm)
    }

    fn all_reduce_sum_f64(&self, local: &[f64]) -> Vec<f64> {
        let mut global = vec![0f64; local.len()];
        self.comm
            .all_reduce_into(local, &mut global[..], SystemOperation::sum());
        global
    }

    fn all_reduce_sum_i64(&self, local: &[i64]) -> Vec<i64> {
        let mut global = vec![0i64; local.len()];
        self.comm
            .all_reduce_into(local, &mut global[..], SystemOperation::sum());
        global
    }

    fn all_reduce_and(&self, local: bool) -> bool {
        let mut global = false;
        self.comm
            .all_reduce_into(&local, &mut global, SystemOperation::logical_and());
        global
    }

    #[inline]
    fn broadcast_f64(&self, buf: &mut Vec<f64>, root: usize) {
        self.broadcast_vec(buf, root)
    }

    #[inline]
    fn broadcast_i64(&self, buf: &mut Vec<i64>, root: usize) {
        self.broadcast_vec(buf, root)
    }

    fn all_gather_f64(&self, local: &[f64]) -> Vec<Vec<f64>> {
        let local_len = local.len() as Count;
        let mut counts = vec![0 as Count; self.world_size];
        self.comm.all_gather_into(&local_len, &mut counts[..]);

        let displs = counts
            .iter()
            .scan(0 as Count, |offset, &count| {
                let start = *offset;
                *offset += count;
                Some(start)
            })
            .collect::<Vec<_>>();
        let total = counts.iter().sum::<Count>() as usize;

        let mut flat = vec![0f64; total];
        {
            let mut partition = PartitionMut::new(&mut flat[..], &counts[..], &displs[..]);
            self.comm.all_gather_varcount_into(local, &mut partition);
        }

        counts
            .iter()
            .zip(&displs)
            .map(|(&count, &start)| flat[start as usize..(start + count) as usize].to_vec())
            .collect()
    }

    #[inline]
    fn barrier(&self) {
        self.comm.barrier();
    }
}
