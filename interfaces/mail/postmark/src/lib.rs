//! Client for a Postmark-style transactional email API.
//!
//! - `index::PostmarkClient` posts single messages to `{base_url}/email`
//! - Authenticated with the `X-Postmark-Server-Token` header

pub mod index;
