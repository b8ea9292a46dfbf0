//! Error types for clusterset-dns.

use hickory_proto::op::ResponseCode;
use thiserror::Error;

/// Errors raised while setting up or running the server.
#[derive(Debug, Error)]
pub enum DnsError {
    /// IO error (socket bind, network).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// DNS protocol error.
    #[error("DNS protocol error: {0}")]
    Proto(#[from] hickory_proto::ProtoError),
}

/// Per-query failures. Each variant maps onto the DNS response code
/// reported to the client; only [`ServeError::WriteFailure`] reflects a
/// failure after a response was otherwise ready.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The query name is under none of the served zones.
    #[error("{qname} is not in any served zone")]
    NotZone {
        /// Offending query name.
        qname: String,
    },

    /// The name does not resolve: unknown service, pod subtree, or a
    /// name outside the service grammar.
    #[error("no authoritative records for {qname}")]
    NameError {
        /// Offending query name.
        qname: String,
    },

    /// The request carried no usable question.
    #[error("malformed query: {0}")]
    Malformed(#[from] hickory_proto::ProtoError),

    /// Fallthrough matched but no downstream handler is wired.
    #[error("fallthrough configured but no downstream handler")]
    NoDownstream,

    /// Writing the response to the client failed.
    #[error("failed to write response: {0}")]
    WriteFailure(#[source] std::io::Error),
}

impl ServeError {
    /// DNS response code for this failure.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            Self::NotZone { .. } => ResponseCode::NotZone,
            Self::NameError { .. } => ResponseCode::NXDomain,
            Self::Malformed(_) => ResponseCode::FormErr,
            Self::NoDownstream | Self::WriteFailure(_) => ResponseCode::ServFail,
        }
    }
}
