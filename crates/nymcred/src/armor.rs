//! Armored text form for out-of-band credential transfer.
//!
//! Base64 between fixed fences, 64 characters per line. Only the public
//! form of a credential is ever armored.

use crate::credential::Credential;
use crate::error::{CredError, CredResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const ARMOR_HEADER: &str = "-----BEGIN NYM CREDENTIAL-----";
pub const ARMOR_FOOTER: &str = "-----END NYM CREDENTIAL-----";

const LINE_WIDTH: usize = 64;

/// Armor the public form of a credential.
pub fn armor_credential(credential: &Credential) -> CredResult<String> {
    let blob = credential.to_public().to_blob()?;
    let encoded = STANDARD.encode(&blob);

    let mut out = String::with_capacity(encoded.len() + 128);
    out.push_str(ARMOR_HEADER);
    out.push('\n');
    for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
        // chunks of ASCII base64 output are always valid UTF-8
        out.push_str(std::str::from_utf8(chunk).map_err(|e| {
            CredError::Serialization(e.to_string())
        })?);
        out.push('\n');
    }
    out.push_str(ARMOR_FOOTER);
    out.push('\n');
    Ok(out)
}

/// Parse an armored credential, tolerating surrounding text and varying
/// line breaks inside the fences.
pub fn parse_armored(input: &str) -> CredResult<Credential> {
    let start = input
        .find(ARMOR_HEADER)
        .ok_or_else(|| CredError::Deserialization("missing armor header".into()))?;
    let after_header = start + ARMOR_HEADER.len();
    let end = input[after_header..]
        .find(ARMOR_FOOTER)
        .ok_or_else(|| CredError::Deserialization("missing armor footer".into()))?;

    let body: String = input[after_header..after_header + end]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let blob = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| CredError::Deserialization(format!("invalid armor body: {}", e)))?;

    Credential::from_blob(&blob)
}
