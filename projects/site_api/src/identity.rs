use std::fmt;
use std::net::IpAddr;

use serde::Serialize;
use sha2::{Digest, Sha256};

const CALLER_ID_HEX_LEN: usize = 32;
const MAX_CLIENT_SUPPLIED_LEN: usize = 64;

/// Opaque stand-in for "the same visitor". Not an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    /// Accepts an id supplied by the browser if it is safe to store as a line.
    pub fn from_client(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let valid = !raw.is_empty()
            && raw.len() <= MAX_CLIENT_SUPPLIED_LEN
            && raw.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the caller id from network address and client signature.
pub fn identity(address: IpAddr, signature: &str) -> CallerId {
    let mut hasher = Sha256::new();
    hasher.update(address.to_string().as_bytes());
    hasher.update(signature.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(CALLER_ID_HEX_LEN);
    CallerId(digest)
}
