//! Session error taxonomy.

use thiserror::Error;

/// Errors that can end or redirect a proxied session.
///
/// All variants are session-local; the only cross-session effect is the
/// shared health and inflight bookkeeping inside the registry.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An outbound connect attempt failed. Transient: the backend is
    /// quarantined and iteration advances to the next candidate.
    #[error("connect to backend {index} ({addr}) failed: {source}")]
    Connect {
        index: usize,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Selection yielded no candidates, or every candidate failed to
    /// connect. Terminal: the client connection is closed without a
    /// response.
    #[error("no backend available")]
    NoBackendAvailable,

    /// I/O failure after the backend connection was established. Ends the
    /// session without trying another backend; forwarded bytes cannot be
    /// replayed.
    #[error("relay failed: {0}")]
    Relay(#[from] std::io::Error),
}
