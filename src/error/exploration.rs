//! This module contains errors pertaining to the exploration of the target
//! by the [`crate::explorer::Explorer`].

use thiserror::Error;

use crate::{
    backend::{arch::Arch, Fault},
    error::container,
};

/// Errors that occur while exploring the target program.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("The initial context has no symbolic variables to explore over")]
    NoSymbolicVariables,

    #[error("The architecture {architecture} cannot synthesise a return instruction")]
    NoReturnInstruction { architecture: Arch },

    #[error("Invalid control flow: the program counter points to undefined memory")]
    InvalidControlFlow,

    #[error("The back-end faulted while processing an instruction: {fault}")]
    BackendFault { fault: Fault },

    #[error("Exploration was stopped by the watchdog")]
    StoppedByWatchdog,
}

/// An exploration error with the address of the instruction at which it
/// occurred attached.
pub type LocatedError = container::Located<Error>;

/// A container of exploration errors, used to aggregate the faults observed
/// across traces.
pub type Errors = container::Errors<LocatedError>;

/// The result type for methods that may have exploration errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

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
