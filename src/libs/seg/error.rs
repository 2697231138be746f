use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SegError {
    /// The Newton-Raphson system is singular, or the segment carries no
    /// counts at all; no maximum-likelihood estimate exists.
    Degenerate { len: usize },
    /// The iteration cap was hit before the gradient reached tolerance.
    NonConvergence { iters: usize },
    /// Working buffers or the score matrix could not be allocated.
    Resource { what: &'static str, bytes: usize },
}

impl fmt::Display for SegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegError::Degenerate { len } => {
                write!(f, "degenerate fit for a segment of {} cells", len)
            }
            SegError::NonConvergence { iters } => {
                write!(f, "fit did not converge within {} iterations", iters)
            }
            SegError::Resource { what, bytes } => {
                write!(f, "could not allocate {} ({} bytes)", what, bytes)
            }
        }
    }
}

impl std::error::Error for SegError {}
