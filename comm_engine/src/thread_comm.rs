//! This module simulates a message-passing group with threads of one process.
//!
//! Assumptions
//! 1. Every rank runs on its own thread of a dedicated rayon pool; the pool has exactly one
//!    thread per rank, so blocking in a collective never starves another rank.
//! 2. Each rank writes only its own slot of the shared exchange area.
//! 3. Each rank reads all slots once every rank has written.
//! 4. IMPORTANT!!! The ranks are synchronized by the collective calls themselves; all ranks of a
//!    group issue the same sequence of calls with matching payload types.

use std::{
    any::Any,
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Barrier, Mutex, MutexGuard, PoisonError},
};

use itertools::izip;
use rayon::ThreadPoolBuilder;

use crate::{CommEngine, CommResult};

type Slot = Option<Box<dyn Any + Send>>;

/// Exchange area shared by all ranks of one group
struct SharedMemory {
    size: usize,
    barrier: Barrier,
    slots: Mutex<Vec<Slot>>,
    // groups created by an ongoing split, keyed by color
    subgroups: Mutex<HashMap<usize, Arc<SharedMemory>>>,
}

impl SharedMemory {
    fn new(size: usize) -> Self {
        Self {
            size,
            barrier: Barrier::new(size),
            slots: Mutex::new((0..size).map(|_| None).collect()),
            subgroups: Mutex::new(HashMap::new()),
        }
    }
}

#[inline]
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fold the contributions in rank order. Integer callers pass a wrapping add, as `MPI_SUM` wraps
fn sum_in_rank_order<T: Copy>(contributions: Vec<Vec<T>>, add: impl Fn(T, T) -> T) -> Vec<T> {
    let mut contributions = contributions.into_iter();
    let mut acc = contributions.next().unwrap_or_default();
    for contribution in contributions {
        assert_eq!(
            acc.len(),
            contribution.len(),
            "all-reduce buffers differ in length across ranks"
        );
        izip!(acc.iter_mut(), contribution).for_each(|(a, b)| *a = add(*a, b));
    }
    acc
}

#[derive(Clone)]
pub struct ThreadComm {
    pub world_size: usize,
    pub world_rank: usize,
    shared: Arc<SharedMemory>,
}

impl Debug for ThreadComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadComm")
            .field("world_size", &self.world_size)
            .field("world_rank", &self.world_rank)
            .finish()
    }
}

impl PartialEq for ThreadComm {
    fn eq(&self, other: &Self) -> bool {
        // equality is based on rank and size
        // it doesn't check the ranks share an exchange area
        self.world_rank == other.world_rank && self.world_size == other.world_size
    }
}

impl ThreadComm {
    /// Run `f` once per rank of a fresh group of `world_size` ranks and collect the results in
    /// rank order.
    pub fn launch<R, F>(world_size: usize, f: F) -> CommResult<Vec<R>>
    where
        F: Fn(ThreadComm) -> R + Sync,
        R: Send,
    {
        assert!(world_size > 0, "a group needs at least one rank");

        let pool = ThreadPoolBuilder::new()
            .num_threads(world_size)
            .thread_name(|index| format!("rank-{index}"))
            .build()?;
        let shared = Arc::new(SharedMemory::new(world_size));
        log::debug!("launching {world_size} thread ranks");

        Ok(pool.broadcast(|ctx| {
            f(ThreadComm {
                world_size,
                world_rank: ctx.index(),
                shared: shared.clone(),
            })
        }))
    }

    /// Deposit `local`, wait for every rank, and read back all deposits in rank order
    fn exchange<T: Clone + Send + 'static>(&self, local: T) -> Vec<T> {
        lock(&self.shared.slots)[self.world_rank] = Some(Box::new(local));
        self.shared.barrier.wait();

        let gathered = lock(&self.shared.slots)
            .iter()
            .enumerate()
            .map(|(rank, slot)| {
                slot.as_ref()
                    .and_then(|data| data.downcast_ref::<T>())
                    .cloned()
                    .unwrap_or_else(|| {
                        panic!(
                            "rank {rank} joined a different collective call than rank {}",
                            self.world_rank
                        )
                    })
            })
            .collect();

        // nobody may overwrite a slot before everyone has read it
        self.shared.barrier.wait();
        gathered
    }

    fn broadcast_vec<T: Clone + Send + 'static>(&self, buf: &mut Vec<T>, root: usize) {
        assert!(
            root < self.world_size,
            "broadcast root {root} is outside a group of {}",
            self.world_size
        );
        let deposit = (self.world_rank == root).then(|| buf.clone());
        if let Some(value) = self.exchange(deposit).swap_remove(root) {
            *buf = value;
        }
    }
}

impl CommEngine for ThreadComm {
    #[inline(always)]
    fn size(&self) -> usize {
        self.world_size
    }

    #[inline(always)]
    fn rank(&self) -> usize {
        self.world_rank
    }

    fn split(&self, color: usize, key: usize) -> Self {
        let entries = self.exchange((color, key));
        let mut members = entries
            .iter()
            .enumerate()
            .filter(|(_, (c, _))| *c == color)
            .map(|(rank, (_, k))| (*k, rank))
            .collect::<Vec<_>>();
        members.sort_unstable();

        let new_rank = members
            .iter()
            .position(|&(_, rank)| rank == self.world_rank)
            .expect("the calling rank always belongs to its own color");
        let leader = members[0].1;

        if self.world_rank == leader {
            lock(&self.shared.subgroups)
                .insert(color, Arc::new(SharedMemory::new(members.len())));
        }
        self.shared.barrier.wait();
        let shared = lock(&self.shared.subgroups)
            .get(&color)
            .cloned()
            .expect("the leader publishes the subgroup before the barrier");
        self.shared.barrier.wait();
        if self.world_rank == leader {
            lock(&self.shared.subgroups).remove(&color);
        }
        debug_assert_eq!(shared.size, members.len());

        log::trace!(
            "rank {}/{} split into color {color}: rank {new_rank}/{}",
            self.world_rank,
            self.world_size,
            members.len()
        );
        Self {
            world_size: members.len(),
            world_rank: new_rank,
            shared,
        }
    }

    fn all_reduce_sum_f64(&self, local: &[f64]) -> Vec<f64> {
        sum_in_rank_order(self.exchange(local.to_vec()), |a, b| a + b)
    }

    fn all_reduce_sum_i64(&self, local: &[i64]) -> Vec<i64> {
        sum_in_rank_order(self.exchange(local.to_vec()), i64::wrapping_add)
    }

    fn all_reduce_and(&self, local: bool) -> bool {
        self.exchange(local).into_iter().all(|passed| passed)
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
        self.exchange(local.to_vec())
    }

    #[inline]
    fn barrier(&self) {
        self.shared.barrier.wait();
    }
}
