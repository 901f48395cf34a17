//! `vmess://` share-link decoding.
//!
//! Format: `vmess://` + base64(JSON in the [`RawProfile`] shape). Providers
//! mix the standard and URL-safe alphabets and frequently drop padding, so
//! both are normalised before decoding.

use crate::profile::{Profile, RawProfile};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use tb_types::{IssueCode, TunnelError};

pub const VMESS_SCHEME: &str = "vmess://";

/// Decode a share link into its raw, unvalidated form.
pub fn decode_vmess_link(link: &str) -> Result<RawProfile, TunnelError> {
    let body = link.trim().strip_prefix(VMESS_SCHEME).ok_or_else(|| {
        TunnelError::construction(IssueCode::LinkScheme, "/", "link does not start with vmess://")
    })?;

    let normalized: String = body
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();

    let decoded = STANDARD_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| TunnelError::construction(IssueCode::LinkEncoding, "/", e.to_string()))?;

    serde_json::from_slice(&decoded)
        .map_err(|e| TunnelError::construction(IssueCode::LinkEncoding, "/", e.to_string()))
}

/// Decode and validate a share link.
pub fn parse_vmess_link(link: &str) -> Result<Profile, TunnelError> {
    Profile::try_from(decode_vmess_link(link)?)
}

/// Encode a raw profile back into a share link.
pub fn encode_vmess_link(raw: &RawProfile) -> Result<String, TunnelError> {
    let json = serde_json::to_vec(raw)
        .map_err(|e| TunnelError::construction(IssueCode::SerializeFailed, "/", e.to_string()))?;
    Ok(format!(
        "{VMESS_SCHEME}{}",
        base64::engine::general_purpose::STANDARD.encode(json)
    ))
}
