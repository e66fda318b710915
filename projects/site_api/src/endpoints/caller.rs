use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
	extract::{ConnectInfo, FromRequestParts},
	http::{header::USER_AGENT, request::Parts, HeaderMap},
};

use crate::identity::{identity, CallerId};
use crate::AppState;

/// Request metadata the endpoints key their state on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
	pub address: IpAddr,
	pub signature: String,
}

impl Caller {
	pub fn id(&self) -> CallerId {
		identity(self.address, &self.signature)
	}
}

impl FromRequestParts<AppState> for Caller {
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let peer = parts
			.extensions
			.get::<ConnectInfo<SocketAddr>>()
			.map(|ConnectInfo(addr)| addr.ip());
		let forwarded = if state.config.trust_forwarded_for {
			forwarded_ip(&parts.headers)
		} else {
			None
		};

		let address = forwarded
			.or(peer)
			.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
		let signature = parts
			.headers
			.get(USER_AGENT)
			.and_then(|v| v.to_str().ok())
			.unwrap_or("unknown")
			.to_string();

		Ok(Caller { address, signature })
	}
}

/// Client address as reported by a reverse proxy.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
	headers
		.get("x-forwarded-for")
		.and_then(|v| v.to_str().ok())
		.and_then(|s| s.split(',').next())
		.and_then(|s| s.trim().parse().ok())
		.or_else(|| {
			headers
				.get("x-real-ip")
				.and_then(|v| v.to_str().ok())
				.and_then(|s| s.trim().parse().ok())
		})
}
