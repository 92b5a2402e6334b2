use thiserror::Error;

/// Failures of the binary codec. Decode errors name the message region that
/// could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Malformed question: {0}")]
    MalformedQuestion(String),

    #[error("Malformed resource record: {0}")]
    MalformedResource(String),

    #[error("Unsupported record type: {0}")]
    UnsupportedRecordType(u16),

    #[error("Domain name exceeds 255 encoded bytes: {0}")]
    NameTooLong(String),

    #[error("Label exceeds 63 bytes in name: {0}")]
    LabelTooLong(String),

    #[error("Invalid domain name: {0}")]
    InvalidName(String),

    #[error("Message too large: {size} bytes (limit {limit})")]
    MessageTooLarge { size: usize, limit: usize },

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
}

#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Failed to connect to {server}: {reason}")]
    Dial { server: String, reason: String },

    #[error("TLS handshake with {server} failed: {reason}")]
    Handshake { server: String, reason: String },

    #[error("Invalid TLS configuration: {0}")]
    Tls(String),

    #[error("I/O error on {server}: {reason}")]
    Io { server: String, reason: String },

    #[error("Transport timeout on {server}")]
    Timeout { server: String },

    #[error("Connection closed by {server}")]
    Closed { server: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Listener failed on {addr}: {reason}")]
    Listener { addr: String, reason: String },

    #[error("Response id {got} does not match request id {expected}")]
    IdMismatch { expected: u16, got: u16 },

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl TransportError {
    pub fn io(server: impl ToString, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            return TransportError::Closed {
                server: server.to_string(),
            };
        }
        TransportError::Io {
            server: server.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}
