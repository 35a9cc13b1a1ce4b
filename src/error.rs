use thiserror::Error;

use crate::types::{AuthMethod, ReplyStatus};

/// Classifies proxy errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyErrorKind {
    /// Invalid host, port, credentials or client state; raised before any I/O
    Configuration,
    /// Server selected a method other than the one offered
    NegotiationMismatch,
    /// Username/password sub-negotiation was rejected
    AccessDenied,
    /// Non-success reply or malformed record
    Protocol,
    /// Underlying stream I/O error (reset, timeout, short read)
    Transport,
}

/// SOCKS5 client error types
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Method negotiation failed: offered {offered}, server selected {selected}")]
    NegotiationMismatch {
        offered: AuthMethod,
        selected: AuthMethod,
    },

    #[error("Access denied: proxy rejected the supplied credentials")]
    AccessDenied,

    #[error("SOCKS5 protocol error: {message}")]
    ProtocolError {
        status: Option<ReplyStatus>,
        message: String,
    },

    #[error("Transport error: {message}: {source}")]
    TransportError {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProxyError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        ProxyError::ConfigError(message.into())
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        ProxyError::ProtocolError {
            status: None,
            message: message.into(),
        }
    }

    pub(crate) fn reply(status: ReplyStatus) -> Self {
        ProxyError::ProtocolError {
            status: Some(status),
            message: status.message().to_string(),
        }
    }

    pub(crate) fn transport(message: impl Into<String>, source: std::io::Error) -> Self {
        ProxyError::TransportError {
            message: message.into(),
            source,
        }
    }

    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ProxyErrorKind {
        match self {
            ProxyError::ConfigError(_) => ProxyErrorKind::Configuration,
            ProxyError::NegotiationMismatch { .. } => ProxyErrorKind::NegotiationMismatch,
            ProxyError::AccessDenied => ProxyErrorKind::AccessDenied,
            ProxyError::ProtocolError { .. } => ProxyErrorKind::Protocol,
            ProxyError::TransportError { .. } => ProxyErrorKind::Transport,
        }
    }

    /// Whether a fresh attempt on a new connection could succeed.
    ///
    /// Only transport failures qualify; everything else is either permanent
    /// or needs new credentials.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ProxyErrorKind::Transport
    }

    /// The decoded REP value, if this error came from a non-success reply.
    pub fn reply_status(&self) -> Option<ReplyStatus> {
        match self {
            ProxyError::ProtocolError { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
