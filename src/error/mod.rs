//! This module contains the primary error type for the engine's interface.
//! It also re-exports the more specific error types that are
//! subsystem-specific.
//!
//! # Anyhow
//!
//! All of the errors implement [`std::error::Error`], and hence can be used
//! with [`anyhow::Error`] internally. It is _not_ recommended to use that
//! error type in the interface of the library, as this forces clients to
//! also use `anyhow`.

pub mod artifacts;
pub mod container;
pub mod exploration;

use std::sync::Arc;

use thiserror::Error;

/// The interface result type for the library.
pub type Result<T> = std::result::Result<T, Error>;

/// The interface error type for the library.
///
/// All errors returned from the library interface (and hence encountered by
/// the clients of the library) should be members of this enum.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// Errors from the exploration loop itself.
    #[error(transparent)]
    Exploration(#[from] exploration::Error),

    /// Errors from writing artifacts into the workspace.
    #[error(transparent)]
    Artifacts(#[from] artifacts::Error),

    /// Unknown errors, usually from the dependencies of the library.
    ///
    /// It is wrapped in an [`Arc`] to ensure that it can be cloned like the
    /// other error types in this interface error.
    #[error(transparent)]
    Other(Arc<anyhow::Error>),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(Arc::new(value))
    }
}

/// Make it possible to attach instruction addresses to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, address: u64) -> Self::Located {
        container::Located {
            location: address,
            payload: self,
        }
    }
}

/// A library error with an associated instruction address.
pub type LocatedError = container::Located<Error>;

/// Allow simple conversions from located exploration errors by re-wrapping
/// the located error around the more general payload.
impl From<exploration::LocatedError> for LocatedError {
    fn from(value: exploration::LocatedError) -> Self {
        let address = value.location;
        let payload = Error::from(value.payload);
        Self {
            location: address,
            payload,
        }
    }
}
