use thiserror::Error;

use storefront_core::ranking::LoaderError;

pub mod catalog;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use memory::InMemoryCatalog;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for LoaderError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => LoaderError::Unavailable(source.to_string()),
            RepositoryError::Decode(message) => LoaderError::Decode(message),
        }
    }
}
