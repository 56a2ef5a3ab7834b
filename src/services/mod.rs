pub mod instagram;
pub mod lead_service;
pub mod loja_service;
pub mod veiculo_service;

pub use instagram::InstagramPublisher;
pub use lead_service::LeadService;
pub use loja_service::LojaService;
pub use veiculo_service::VeiculoService;

use thiserror::Error;

/// Persistence-layer errors shared by the services. Converted into
/// `ApiError` at the handler boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid: {0}")]
    Invalid(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Postgres unique-violation class, surfaced as 409 instead of 500.
const UNIQUE_VIOLATION: &str = "23505";

impl StoreError {
    pub fn with_conflict(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::Conflict(message.to_string());
            }
        }
        StoreError::Sqlx(err)
    }
}
