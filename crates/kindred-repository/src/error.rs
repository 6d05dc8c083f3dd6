use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("codec error: {0}")]
    Codec(#[from] kindred_codec::CodecError),

    #[error("query error: {0}")]
    Query(#[from] kindred_query::QueryError),

    #[error("store error: {0}")]
    Store(#[from] kindred_store::StoreError),

    #[error("invalid key: {0}")]
    Key(#[from] kindred_types::TypeError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
