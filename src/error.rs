use thiserror::Error;

/// Everything that can abort a solve.
///
/// An unbounded objective is not an error; it is reported as
/// [`Status::Unbounded`](crate::Status) in a successful result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Malformed model or starting basis, detected before any iteration.
    #[error("dimension mismatch: {0}")]
    Dimension(String),

    /// The submatrix selected by the starting basis is not invertible.
    #[error("starting basis selects a singular submatrix")]
    SingularBasis,

    /// The pivot element vanished during the inverse update, leaving the
    /// engine at its last consistent vertex.
    #[error("singular pivot after {iterations} iterations")]
    SingularPivot { iterations: usize },

    /// The iteration cap was reached without a terminal state. Degenerate
    /// models can cycle under the lowest-index tie-break, so the cap is the
    /// only termination guarantee on such inputs.
    #[error("no terminal state within {limit} iterations")]
    IterationLimit { limit: usize },
}
