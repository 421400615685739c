//! Catalog use-case services.
//!
//! # Responsibility
//! - Validate requests and map them onto domain records.
//! - Orchestrate repository calls and shape read results into responses.
//!
//! # Invariants
//! - Invalid requests never reach the repository.
//! - Services stay storage-agnostic; they only see `Repository<E>`.

pub mod album_service;
pub mod track_service;
pub mod validation;

use crate::repo::error::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use validation::ValidationIssue;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Request rejected before touching storage.
    Validation(Vec<ValidationIssue>),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(issues) => {
                let joined = issues
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "invalid request: {joined}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<Vec<ValidationIssue>> for ServiceError {
    fn from(value: Vec<ValidationIssue>) -> Self {
        Self::Validation(value)
    }
}

fn today_utc() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
