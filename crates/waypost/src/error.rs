use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the discovery agent
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid identity or agent address
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport could not be built or the agent is unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// The agent declined the registration request
    #[error("Registration rejected ({status}): {body}")]
    Registration { status: u16, body: String },

    /// The agent failed a key/value operation
    #[error("Key/value error: {0}")]
    KeyValue(String),

    /// Malformed agent response
    #[error("Decode error: {0}")]
    Decode(String),
}
