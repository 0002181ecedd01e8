use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommError {
    #[error("failed to build the rank thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("MPI is already initialized in this process")]
    MPIInit,
}

pub type CommResult<T> = std::result::Result<T, CommError>;
