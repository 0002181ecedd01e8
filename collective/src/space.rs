use std::{ops::Range, sync::Arc};

use comm_engine::CommEngine;

use crate::{CollectiveError, CollectiveResult, DistributedVector, DofLayout, PartitionedVector};

/// A discretization space whose vectors are partitioned over a mesh group
pub trait FunctionSpace {
    type Vector: DistributedVector + 'static;

    /// Rank of the calling process within the group the space is partitioned over
    fn partition_rank(&self) -> usize;

    /// Number of processes the space is partitioned over
    fn partition_size(&self) -> usize;

    /// The vector taking `value` at every degree of freedom
    fn interpolate_constant(&self, value: f64) -> Self::Vector;
}

/// Uniform mesh of `[0, 1]`, each process of the mesh group owning a contiguous block of cells
#[derive(Debug, Clone)]
pub struct IntervalMesh<C: CommEngine> {
    comm: C,
    n_cells: usize,
    // cells of rank r are cell_offsets[r]..cell_offsets[r + 1]
    cell_offsets: Vec<usize>,
}

impl<C: CommEngine> IntervalMesh<C> {
    /// Balanced partition: the first `n_cells % size` ranks own one extra cell
    pub fn new(comm: C, n_cells: usize) -> CollectiveResult<Self> {
        let size = comm.size();
        let counts = (0..size)
            .map(|rank| n_cells / size + usize::from(rank < n_cells % size))
            .collect::<Vec<_>>();
        Self::with_cell_counts(comm, &counts)
    }

    /// Explicit partition: rank `r` owns `counts[r]` consecutive cells
    pub fn with_cell_counts(comm: C, counts: &[usize]) -> CollectiveResult<Self> {
        if counts.len() != comm.size() {
            return Err(CollectiveError::InvalidMesh(format!(
                "{} cell counts for a mesh group of {} processes",
                counts.len(),
                comm.size()
            )));
        }
        if let Some(rank) = counts.iter().position(|&count| count == 0) {
            return Err(CollectiveError::InvalidMesh(format!(
                "rank {rank} owns no cell"
            )));
        }

        let cell_offsets = std::iter::once(0)
            .chain(counts.iter().scan(0, |offset, &count| {
                *offset += count;
                Some(*offset)
            }))
            .collect::<Vec<_>>();
        let n_cells = cell_offsets[counts.len()];

        Ok(Self {
            comm,
            n_cells,
            cell_offsets,
        })
    }

    #[inline]
    pub fn comm(&self) -> &C {
        &self.comm
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        1.0 / self.n_cells as f64
    }

    #[inline]
    pub fn is_last_rank(&self) -> bool {
        self.comm.rank() + 1 == self.comm.size()
    }

    /// Cells owned by the calling process
    #[inline]
    pub fn cell_range(&self) -> Range<usize> {
        let rank = self.comm.rank();
        self.cell_offsets[rank]..self.cell_offsets[rank + 1]
    }

    /// Coordinates of the vertices of the local cells, shared vertices included
    pub fn vertex_coordinates(&self) -> Vec<f64> {
        let cells = self.cell_range();
        (cells.start..=cells.end)
            .map(|vertex| vertex as f64 * self.cell_size())
            .collect()
    }

    /// Piecewise constant space, one degree of freedom per cell
    pub fn cell_space(&self) -> IntervalSpace<C> {
        IntervalSpace::new(self, SpaceKind::Cell)
    }

    /// Piecewise linear space, one degree of freedom per vertex
    pub fn vertex_space(&self) -> IntervalSpace<C> {
        IntervalSpace::new(self, SpaceKind::Vertex)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceKind {
    /// DOFs at cell midpoints
    Cell,
    /// DOFs at vertices. Rank r owns the left vertex of its cells, the last rank also owns the
    /// right end of the mesh; every other rank ghosts the first vertex of its right neighbour.
    Vertex,
}

#[derive(Debug, Clone)]
pub struct IntervalSpace<C: CommEngine> {
    comm: C,
    kind: SpaceKind,
    layout: Arc<DofLayout>,
    owned_points: Vec<f64>,
    ghost_points: Vec<f64>,
}

impl<C: CommEngine> IntervalSpace<C> {
    fn new(mesh: &IntervalMesh<C>, kind: SpaceKind) -> Self {
        let h = mesh.cell_size();
        let cells = mesh.cell_range();

        let (layout, owned_points, ghost_points) = match kind {
            SpaceKind::Cell => {
                let points = cells.clone().map(|c| (c as f64 + 0.5) * h).collect();
                (DofLayout::new(mesh.n_cells(), cells, vec![]), points, vec![])
            }
            SpaceKind::Vertex => {
                let owned = if mesh.is_last_rank() {
                    cells.start..cells.end + 1
                } else {
                    cells.clone()
                };
                let ghosts = if mesh.is_last_rank() {
                    vec![]
                } else {
                    vec![cells.end]
                };
                let points = owned.clone().map(|v| v as f64 * h).collect();
                let ghost_points = ghosts.iter().map(|&v| v as f64 * h).collect();
                (
                    DofLayout::new(mesh.n_cells() + 1, owned, ghosts),
                    points,
                    ghost_points,
                )
            }
        };

        Self {
            comm: mesh.comm().clone(),
            kind,
            layout: Arc::new(layout),
            owned_points,
            ghost_points,
        }
    }

    #[inline]
    pub fn kind(&self) -> SpaceKind {
        self.kind
    }

    #[inline]
    pub fn layout(&self) -> &DofLayout {
        &self.layout
    }

    /// Coordinates of the owned degrees of freedom
    #[inline]
    pub fn dof_coordinates(&self) -> &[f64] {
        &self.owned_points
    }

    /// Nodal interpolation of `f`, ghosts included
    pub fn interpolate(&self, f: impl Fn(f64) -> f64) -> PartitionedVector<C> {
        PartitionedVector::from_parts(
            self.comm.clone(),
            self.layout.clone(),
            self.owned_points.iter().map(|&x| f(x)).collect(),
            self.ghost_points.iter().map(|&x| f(x)).collect(),
        )
    }
}

impl<C: CommEngine + 'static> FunctionSpace for IntervalSpace<C> {
    type Vector = PartitionedVector<C>;

    #[inline]
    fn partition_rank(&self) -> usize {
        self.comm.rank()
    }

    #[inline]
    fn partition_size(&self) -> usize {
        self.comm.size()
    }

    fn interpolate_constant(&self, value: f64) -> Self::Vector {
        self.interpolate(|_| value)
    }
}
