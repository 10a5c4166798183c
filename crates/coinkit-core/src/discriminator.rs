//! Anchor-style discriminators: the first eight bytes of
//! `sha256("<namespace>:<name>")`.

use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Discriminator namespace. Instructions hash under `global`, account types
/// under `account`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Global,
    Account,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Account => "account",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn discriminator(namespace: Namespace, name: &str) -> Result<[u8; 8], CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidArgument(
            "discriminator name must not be empty".to_owned(),
        ));
    }

    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    Ok(out)
}

/// Render as a Rust array literal, e.g. `[175, 175, 109, 31, 13, 152, 155, 237]`.
pub fn format_rust_array(bytes: &[u8]) -> String {
    let parts: Vec<String> = bytes.iter().map(u8::to_string).collect();
    format!("[{}]", parts.join(", "))
}

pub fn format_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
