//! tb-types: cross-crate stable contracts (error taxonomy, issue codes, ports).
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod errors;
pub mod ports;

pub use errors::{ErrorClass, ListenerOp, TunnelError};

/// Stable issue codes attached to configuration construction failures.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    // ----- Profile validation -----
    MissingRequired,
    TypeMismatch,
    OutOfRange,
    // ----- Share links / endpoints -----
    LinkScheme,
    LinkEncoding,
    InvalidUri,
    // ----- Routing rules -----
    InvalidMatcher,
    // ----- Rendering -----
    SerializeFailed,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        use IssueCode::*;
        match self {
            MissingRequired => "MissingRequired",
            TypeMismatch => "TypeMismatch",
            OutOfRange => "OutOfRange",
            LinkScheme => "LinkScheme",
            LinkEncoding => "LinkEncoding",
            InvalidUri => "InvalidUri",
            InvalidMatcher => "InvalidMatcher",
            SerializeFailed => "SerializeFailed",
        }
    }
}

impl Display for IssueCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuecode_serialization() {
        let j = serde_json::to_string(&IssueCode::OutOfRange).unwrap();
        assert_eq!(j, r#""OUT_OF_RANGE""#);
        assert_eq!(IssueCode::LinkEncoding.to_string(), "LinkEncoding");
        let j = serde_json::to_string(&IssueCode::InvalidUri).unwrap();
        assert_eq!(j, r#""INVALID_URI""#);
    }
}
