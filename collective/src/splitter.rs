use comm_engine::CommEngine;

use crate::{CollectiveError, CollectiveResult};

/// Position of a process in the `n_subdomain x n_instance` grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridAddress {
    /// Subdomain index (grid row)
    pub color: usize,
    /// Ensemble instance index (grid column)
    pub key: usize,
}

/// Dimensions of the process grid.
///
/// Rows are mesh subdomains and columns are ensemble instances:
/// `rank = color * n_instance + key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGrid {
    n_subdomain: usize,
    n_instance: usize,
}

impl ProcessGrid {
    pub fn new(world_size: usize, n_subdomain: usize, n_instance: usize) -> CollectiveResult<Self> {
        if n_subdomain == 0 || n_instance == 0 || n_subdomain.checked_mul(n_instance) != Some(world_size)
        {
            return Err(CollectiveError::Configuration {
                world_size,
                n_subdomain,
                n_instance,
            });
        }
        Ok(Self {
            n_subdomain,
            n_instance,
        })
    }

    #[inline]
    pub fn n_subdomain(&self) -> usize {
        self.n_subdomain
    }

    #[inline]
    pub fn n_instance(&self) -> usize {
        self.n_instance
    }

    #[inline]
    pub fn world_size(&self) -> usize {
        self.n_subdomain * self.n_instance
    }

    #[inline]
    pub fn address(&self, rank: usize) -> GridAddress {
        debug_assert!(rank < self.world_size());
        GridAddress {
            color: rank / self.n_instance,
            key: rank % self.n_instance,
        }
    }

    #[inline]
    pub fn rank_of(&self, address: GridAddress) -> usize {
        debug_assert!(address.color < self.n_subdomain && address.key < self.n_instance);
        address.color * self.n_instance + address.key
    }
}

/// The two groups every process belongs to
#[derive(Debug, Clone)]
pub struct SplitComms<C: CommEngine> {
    pub grid: ProcessGrid,
    /// Processes of one ensemble instance, one per subdomain, ranked by subdomain
    pub mesh: C,
    /// Processes of one subdomain, one per ensemble instance, ranked by instance
    pub collective: C,
}

/// Carve `world` into mesh groups (`n_instance` of them, each of size `n_subdomain`) and
/// collective groups (`n_subdomain` of them, each of size `n_instance`).
///
/// Collective over `world`. All processes must pass the same dimensions; a mismatch with the
/// size of `world` is reported before any group is created.
pub fn split_communicators<C: CommEngine>(
    world: &C,
    n_subdomain: usize,
    n_instance: usize,
) -> CollectiveResult<SplitComms<C>> {
    let grid = ProcessGrid::new(world.size(), n_subdomain, n_instance)?;
    let GridAddress { color, key } = grid.address(world.rank());

    let mesh = world.split(key, color);
    let collective = world.split(color, key);

    log::debug!(
        "rank {} at (subdomain {color}, instance {key}): mesh rank {}/{}, collective rank {}/{}",
        world.rank(),
        mesh.rank(),
        mesh.size(),
        collective.rank(),
        collective.size()
    );
    Ok(SplitComms {
        grid,
        mesh,
        collective,
    })
}
