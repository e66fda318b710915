//! Backend of the Linux Studio website
//!
//! - REST API endpoints in `endpoints/`: contact mailer and star counter
//! - Flat-file state (star counter, per-sender cooldowns) in `store/`
//! - Outgoing mail rendering in `contact/` and `mail/`
//! - Configured from env vars, see `config.rs`

pub mod config;
pub mod contact;
pub mod endpoints;
pub mod identity;
pub mod mail;
pub mod store;
pub mod sweeper;

use std::sync::Arc;

use axum::{
	http::{
		header::{
			CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
		},
		HeaderValue, Method,
	},
	routing::{get, post},
	Router,
};
use tower_http::{
	cors::{Any, CorsLayer},
	set_header::SetResponseHeaderLayer,
	trace::TraceLayer,
};

use config::Config;
use endpoints::star;
use mail::{template::Brand, MailTransport};
use store::Store;

/// Shared application state passed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
	pub config: Arc<Config>,
	pub brand: Arc<Brand>,
	pub mailer: Arc<dyn MailTransport>,
	pub star_store: Arc<dyn Store>,
	pub rate_limit_store: Arc<dyn Store>,
}

impl AppState {
	pub fn new(
		config: Config,
		mailer: Arc<dyn MailTransport>,
		star_store: Arc<dyn Store>,
		rate_limit_store: Arc<dyn Store>,
	) -> Self {
		let brand = Brand {
			site_name: config.site.name.clone(),
			site_url: config.site.url.clone(),
			github_url: config.site.github_url.clone(),
			mailbox: config.mail.from_address.clone(),
		};
		Self {
			config: Arc::new(config),
			brand: Arc::new(brand),
			mailer,
			star_store,
			rate_limit_store,
		}
	}
}

pub fn build_router(state: AppState) -> Router {
	let cors = CorsLayer::new()
		.allow_origin(Any)
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers([CONTENT_TYPE]);

	Router::new()
		.route(
			"/api/contact",
			post(endpoints::contact::submit::index::handler)
				.options(endpoints::contact::preflight)
				.fallback(endpoints::contact::method_not_allowed),
		)
		.route(
			"/api/star",
			get(star::status::index::handler)
				.post(star::toggle::index::handler)
				.fallback(star::unsupported_method),
		)
		.with_state(state)
		.layer(SetResponseHeaderLayer::if_not_present(
			X_FRAME_OPTIONS,
			HeaderValue::from_static("DENY"),
		))
		.layer(SetResponseHeaderLayer::if_not_present(
			X_XSS_PROTECTION,
			HeaderValue::from_static("1; mode=block"),
		))
		.layer(SetResponseHeaderLayer::if_not_present(
			X_CONTENT_TYPE_OPTIONS,
			HeaderValue::from_static("nosniff"),
		))
		.layer(SetResponseHeaderLayer::if_not_present(
			REFERRER_POLICY,
			HeaderValue::from_static("strict-origin-when-cross-origin"),
		))
		.layer(cors)
		.layer(TraceLayer::new_for_http())
}
