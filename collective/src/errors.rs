use comm_engine::CommError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectiveError {
    #[error(
        "process grid of {n_subdomain} subdomain(s) x {n_instance} instance(s) does not match a world of {world_size} process(es)"
    )]
    Configuration {
        world_size: usize,
        n_subdomain: usize,
        n_instance: usize,
    },

    #[error("unknown operation `{0}`, expected `sum` or `avg`")]
    UnsupportedOperation(String),

    #[error("{collective}.{method} not implemented for payload of kind {kind}")]
    UnsupportedPayload {
        collective: &'static str,
        method: &'static str,
        kind: String,
    },

    #[error("root {root} is out of range for a collective of size {size}")]
    InvalidRoot { root: usize, size: usize },

    #[error("local segment holds {expected} entries, got {found}")]
    LocalSizeMismatch { expected: usize, found: usize },

    #[error("multi-vector entries must share one kind: expected {expected}, found {found}")]
    HeterogeneousMultiVector { expected: String, found: String },

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("communication error: {0}")]
    Comm(#[from] CommError),
}

pub type CollectiveResult<T> = std::result::Result<T, CollectiveError>;
