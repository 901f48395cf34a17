//! Core error types for cross-crate error handling.
//!
//! Every failure surfaced by the configuration builders, the listener manager
//! and the latency prober is one of the four [`TunnelError`] variants. None of
//! them is retried inside the library; retry policy belongs to the caller.

use crate::IssueCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// High-level error classification for logging.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Malformed input or a configuration object that could not be built.
    Config,
    /// Tunnel core refused an install/remove command.
    Core,
    /// I/O or network connectivity errors (connect, TLS, DNS).
    Io,
    /// Operation timed out.
    Timeout,
    /// Peer answered, but not the way we expected.
    Protocol,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::Core => "core",
            Self::Io => "io",
            Self::Timeout => "timeout",
            Self::Protocol => "protocol",
        };
        f.write_str(s)
    }
}

/// Which tunnel core command failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerOp {
    Remove,
    Install,
    /// Swapping the routing or DNS section of a running core.
    Configure,
}

impl fmt::Display for ListenerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remove => f.write_str("remove"),
            Self::Install => f.write_str("install"),
            Self::Configure => f.write_str("configure"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TunnelError {
    /// A profile was malformed or a configuration object could not be rendered.
    /// Nothing is handed to the tunnel core when this is returned.
    #[error("construction error [{code}] at {ptr}: {message}")]
    Construction {
        code: IssueCode,
        ptr: String,
        message: String,
    },

    /// The tunnel core rejected a command. For `Remove` and `Install`, `tag` is
    /// the inbound listener and the previous listener may already be gone when
    /// `op` is `Install`. For `Configure`, `tag` names the section that was
    /// being swapped (`routing` or `dns`).
    #[error("core {op} failed for '{tag}': {message}")]
    Listener {
        tag: String,
        op: ListenerOp,
        message: String,
    },

    /// DNS/connect/TLS/timeout failure while a probe was in flight.
    #[error("probe transport error ({class}): {message}")]
    ProbeTransport { class: ErrorClass, message: String },

    /// A probe completed but did not answer 204 No Content.
    #[error("probe #{attempt} returned unexpected status: {status_line}")]
    ProbeStatus {
        attempt: u8,
        status: u16,
        status_line: String,
    },
}

impl TunnelError {
    #[inline]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Construction { .. } => ErrorClass::Config,
            Self::Listener { .. } => ErrorClass::Core,
            Self::ProbeTransport { class, .. } => *class,
            Self::ProbeStatus { .. } => ErrorClass::Protocol,
        }
    }

    // Convenience constructors

    #[inline]
    pub fn construction(
        code: IssueCode,
        ptr: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Construction {
            code,
            ptr: ptr.into(),
            message: message.into(),
        }
    }

    #[inline]
    pub fn listener(tag: impl Into<String>, op: ListenerOp, message: impl Into<String>) -> Self {
        Self::Listener {
            tag: tag.into(),
            op,
            message: message.into(),
        }
    }

    #[inline]
    pub fn transport(class: ErrorClass, message: impl Into<String>) -> Self {
        Self::ProbeTransport {
            class,
            message: message.into(),
        }
    }

    #[inline]
    pub fn status(attempt: u8, status: u16, status_line: impl Into<String>) -> Self {
        Self::ProbeStatus {
            attempt,
            status,
            status_line: status_line.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_class_follows_variant() {
        let e = TunnelError::construction(IssueCode::OutOfRange, "/port", "port 0");
        assert_eq!(e.class(), ErrorClass::Config);

        let e = TunnelError::transport(ErrorClass::Timeout, "operation timed out");
        assert_eq!(e.class(), ErrorClass::Timeout);

        let e = TunnelError::listener("socks-in", ListenerOp::Remove, "busy");
        assert_eq!(e.class(), ErrorClass::Core);
    }

    #[test]
    fn status_error_mentions_status_line() {
        let e = TunnelError::status(1, 403, "403 Forbidden");
        let msg = e.to_string();
        assert!(msg.contains("403"), "{msg}");
        assert!(msg.contains("probe #1"), "{msg}");
    }

    #[test]
    fn listener_error_display() {
        let e = TunnelError::listener("socks-in", ListenerOp::Install, "address in use");
        assert_eq!(
            e.to_string(),
            "core install failed for 'socks-in': address in use"
        );

        let e = TunnelError::listener("routing", ListenerOp::Configure, "rule rejected");
        assert_eq!(e.class(), ErrorClass::Core);
        assert_eq!(e.to_string(), "core configure failed for 'routing': rule rejected");
        assert_eq!(
            serde_json::to_value(ListenerOp::Configure).unwrap(),
            serde_json::json!("configure")
        );
    }

    #[test]
    fn error_serialization() {
        let e = TunnelError::status(2, 500, "500 Internal Server Error");
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("Internal Server Error"));
    }
}
