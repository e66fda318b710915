use std::net::IpAddr;

use sha2::{Digest, Sha256};

pub const RATE_LIMIT_KEY_PREFIX: &str = "email_";
const RATE_LIMIT_KEY_SUFFIX: &str = ".lock";

/// Store key of the cooldown record for one (address, identifier) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitKey(String);

impl RateLimitKey {
    pub fn new(address: IpAddr, identifier: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(address.to_string().as_bytes());
        hasher.update(identifier.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(format!("{RATE_LIMIT_KEY_PREFIX}{digest}{RATE_LIMIT_KEY_SUFFIX}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(key: &str) -> bool {
        key.starts_with(RATE_LIMIT_KEY_PREFIX) && key.ends_with(RATE_LIMIT_KEY_SUFFIX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { remaining_secs: u64 },
}

/// Parses the decimal Unix timestamp held by a record.
pub fn parse_timestamp(contents: &str) -> Option<i64> {
    contents.trim().parse().ok()
}
