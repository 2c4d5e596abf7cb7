use thiserror::Error;

use crate::{store::StoreError, validate::ValidationError};

/// Operation context attached to store failures raised by a find.
pub const FIND_LOCATIONS_OPERATION: &str = "failed to find the locations within the range";

/// Errors from setting up a finder: configuration, logging and dataset loading.
#[derive(Error, Debug)]
pub enum NearbyError {
    #[error("Data processing error: {0}")]
    DataProcessing(#[from] nearby_data_processing::DataError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, NearbyError>;

/// Which side of the boundary a [`FindError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input from the caller.
    Validation,
    /// The store could not answer.
    Store,
}

/// The two ways a find can fail.
#[derive(Error, Debug)]
pub enum FindError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl FindError {
    pub(crate) fn store(source: StoreError) -> Self {
        Self::Store {
            operation: FIND_LOCATIONS_OPERATION,
            source,
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store { .. } => ErrorKind::Store,
        }
    }

    /// Status code reported to clients: `"400"` for validation, `"500"` for storage.
    pub const fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "400",
            ErrorKind::Store => "500",
        }
    }
}
