#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Bad configuration input: unknown builder kind, inverted bounds, bad pattern.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Negotiation could not resolve a builder or mapper at request time.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Mapping error: {0}")]
    Mapping(String),
}
