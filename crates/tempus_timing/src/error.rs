//! Error types for design mutation and timing queries.

use thiserror::Error;

/// The result type of fallible engine operations.
pub type TimingResult<T> = Result<T, TimingError>;

/// An error raised by a design mutator or query.
///
/// Mutators abort atomically when they return an error: no partial state
/// change is left behind. Recoverable conditions (assertions on the wrong
/// pin kind, unknown cells at gate insertion) are reported as warnings
/// through the diagnostic sink instead and the operation proceeds.
#[derive(Debug, Error)]
pub enum TimingError {
    /// A cycle or disconnected component where a tree/DAG is required.
    #[error("bad topology: {0}")]
    BadTopology(String),

    /// A named cell is absent from the libraries where one is required.
    #[error("cell \"{0}\" is not present in the libraries")]
    MissingCell(String),

    /// A named pin does not exist in the design.
    #[error("pin \"{0}\" does not exist")]
    MissingPin(String),

    /// A named net does not exist in the design.
    #[error("net \"{0}\" does not exist")]
    MissingNet(String),

    /// A named gate does not exist in the design.
    #[error("gate \"{0}\" does not exist")]
    MissingGate(String),

    /// A name is already taken by another design object of the same kind.
    #[error("name \"{0}\" already exists")]
    DuplicateName(String),

    /// A structurally illegal mutation, e.g. removing a connected gate.
    #[error("invalid mutation: {0}")]
    InvalidMutation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            TimingError::MissingPin("u1:a".into()).to_string(),
            "pin \"u1:a\" does not exist"
        );
        assert_eq!(
            TimingError::InvalidMutation("net still connected".into()).to_string(),
            "invalid mutation: net still connected"
        );
    }
}
