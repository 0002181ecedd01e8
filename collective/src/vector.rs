use std::{any::Any, fmt::Debug, ops::Range, sync::Arc};

use comm_engine::CommEngine;

use crate::{CollectiveError, CollectiveResult};

/// A field vector partitioned over the processes of a mesh group.
///
/// Each process owns one contiguous segment of the global vector. After overwriting that segment
/// with [`DistributedVector::set_local`], the caller must invoke [`DistributedVector::apply`] so
/// that the global representation (ghost copies held by neighbouring processes) is consistent
/// again. `apply` is collective over the vector's own partition.
pub trait DistributedVector: Debug {
    /// Entries owned by the calling process
    fn local(&self) -> &[f64];

    /// Overwrite the owned entries. Fails if `values` does not have the local size.
    fn set_local(&mut self, values: &[f64]) -> CollectiveResult<()>;

    /// Synchronize after a local write
    fn apply(&mut self);

    /// Number of processes the vector is partitioned over
    fn partition_size(&self) -> usize;

    /// Length of the global vector
    fn global_size(&self) -> usize;

    fn clone_box(&self) -> Box<dyn DistributedVector>;

    /// Access to the concrete vector behind a [`crate::Payload::Field`]
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn DistributedVector> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Ownership of the degrees of freedom on one process.
///
/// Owned ranges are contiguous, ascending with the rank, and cover `0..global_size` once taken
/// over the whole partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofLayout {
    pub global_size: usize,
    pub owned: Range<usize>,
    /// Global indices of entries owned elsewhere but read locally
    pub ghosts: Vec<usize>,
}

impl DofLayout {
    pub fn new(global_size: usize, owned: Range<usize>, ghosts: Vec<usize>) -> Self {
        assert!(owned.end <= global_size);
        debug_assert!(ghosts
            .iter()
            .all(|g| *g < global_size && !owned.contains(g)));
        Self {
            global_size,
            owned,
            ghosts,
        }
    }

    #[inline]
    pub fn local_size(&self) -> usize {
        self.owned.len()
    }
}

#[derive(Debug, Clone)]
pub struct PartitionedVector<C: CommEngine> {
    comm: C,
    layout: Arc<DofLayout>,
    owned: Vec<f64>,
    ghosts: Vec<f64>,
}

impl<C: CommEngine> PartitionedVector<C> {
    /// A zero vector
    pub fn new(comm: C, layout: Arc<DofLayout>) -> Self {
        let owned = vec![0.0; layout.local_size()];
        let ghosts = vec![0.0; layout.ghosts.len()];
        Self {
            comm,
            layout,
            owned,
            ghosts,
        }
    }

    pub fn with_values(
        comm: C,
        layout: Arc<DofLayout>,
        owned: Vec<f64>,
        ghosts: Vec<f64>,
    ) -> CollectiveResult<Self> {
        if owned.len() != layout.local_size() {
            return Err(CollectiveError::LocalSizeMismatch {
                expected: layout.local_size(),
                found: owned.len(),
            });
        }
        if ghosts.len() != layout.ghosts.len() {
            return Err(CollectiveError::LocalSizeMismatch {
                expected: layout.ghosts.len(),
                found: ghosts.len(),
            });
        }
        Ok(Self::from_parts(comm, layout, owned, ghosts))
    }

    pub(crate) fn from_parts(
        comm: C,
        layout: Arc<DofLayout>,
        owned: Vec<f64>,
        ghosts: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(owned.len(), layout.local_size());
        debug_assert_eq!(ghosts.len(), layout.ghosts.len());
        Self {
            comm,
            layout,
            owned,
            ghosts,
        }
    }

    #[inline]
    pub fn comm(&self) -> &C {
        &self.comm
    }

    #[inline]
    pub fn layout(&self) -> &DofLayout {
        &self.layout
    }

    #[inline]
    pub fn ghosts(&self) -> &[f64] {
        &self.ghosts
    }

    /// L2 norm of the owned entries only
    pub fn local_norm_l2(&self) -> f64 {
        self.owned.iter().map(|x| x * x).sum::<f64>().sqrt()
    }
}

impl<C: CommEngine + 'static> DistributedVector for PartitionedVector<C> {
    #[inline]
    fn local(&self) -> &[f64] {
        &self.owned
    }

    fn set_local(&mut self, values: &[f64]) -> CollectiveResult<()> {
        if values.len() != self.owned.len() {
            return Err(CollectiveError::LocalSizeMismatch {
                expected: self.owned.len(),
                found: values.len(),
            });
        }
        self.owned.copy_from_slice(values);
        Ok(())
    }

    fn apply(&mut self) {
        let global = self.comm.all_gather_f64(&self.owned).concat();
        assert_eq!(
            global.len(),
            self.layout.global_size,
            "owned segments do not cover the global vector"
        );
        self.ghosts = self.layout.ghosts.iter().map(|&g| global[g]).collect();
    }

    #[inline]
    fn partition_size(&self) -> usize {
        self.comm.size()
    }

    #[inline]
    fn global_size(&self) -> usize {
        self.layout.global_size
    }

    fn clone_box(&self) -> Box<dyn DistributedVector> {
        Box::new(self.clone())
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}
