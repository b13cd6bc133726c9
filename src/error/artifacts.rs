//! This module contains errors pertaining to the on-disk artifacts written
//! by the exploration engine.

use std::{path::PathBuf, sync::Arc};

use thiserror::Error;

/// Errors that occur while writing exploration artifacts to the workspace.
///
/// The underlying [`std::io::Error`] is wrapped in an [`Arc`] so that these
/// errors can be cloned like the other error types in the interface.
#[derive(Clone, Debug, Error)]
pub enum Error {
    #[error("Could not create the workspace directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },

    #[error("Could not write the artifact {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },
}

/// The result type for methods that write artifacts.
pub type Result<T> = std::result::Result<T, Error>;
