//! Collective communication for ensembles of PDE solves on a 2-D process grid
//!
//! - Splitter: carve the world into mesh groups (one PDE instance across subdomains) and
//!   collective groups (one subdomain across instances)
//! - Collective: sum/average reductions and broadcasts of scalars, buffers, distributed field
//!   vectors and multi-vectors across the instances, with a single-process `NullCollective`
//!   and a `GridCollective` over a collective group
//! - Consistency: verify that every instance partitions its mesh identically, which the field
//!   reductions of `GridCollective` rely on
//!
//! MISC: every operation that communicates is a blocking collective call; all processes of the
//! group must make the same calls in the same order.

mod consistency;
mod definition;
mod errors;
mod grid;
mod null;
mod op;
mod payload;
mod space;
mod splitter;
mod vector;

pub use consistency::{check_mesh_consistent_partitioning, check_space_consistent_partitioning};
pub use definition::Collective;
pub use errors::{CollectiveError, CollectiveResult};
pub use grid::GridCollective;
pub use null::NullCollective;
pub use op::ReduceOp;
pub use payload::{ForeignPayload, MultiVector, Payload, PayloadKind};
pub use space::{FunctionSpace, IntervalMesh, IntervalSpace, SpaceKind};
pub use splitter::{split_communicators, GridAddress, ProcessGrid, SplitComms};
pub use vector::{DistributedVector, DofLayout, PartitionedVector};
