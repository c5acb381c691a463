/// Coarse classification shared by every service error, used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// A referenced id does not exist.
    NotFound,
    /// The request contradicts the current relationship state.
    Conflict,
    Internal,
}
