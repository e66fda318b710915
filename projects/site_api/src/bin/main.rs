use std::net::SocketAddr;
use std::sync::Arc;

use axum::serve;
use projects_site_api::{
	build_router,
	config::{Config, ConfigError},
	mail::{build_transport, BuildTransportError},
	store::{FlatFileStore, StoreError},
	sweeper::spawn_rate_limit_sweeper,
	AppState,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MainError {
	#[error("Config: {source}")]
	Config {
		#[source]
		source: ConfigError,
	},
	#[error("TracingInit: {source}")]
	TracingInit {
		#[source]
		source: utils_trace::TracingInitError,
	},
	#[error("MailTransport: {source}")]
	MailTransport {
		#[source]
		source: BuildTransportError,
	},
	#[error("OpenStore: {source}")]
	OpenStore {
		#[source]
		source: StoreError,
	},
	#[error("TcpListenerBind: {source}")]
	TcpListenerBind {
		#[source]
		source: std::io::Error,
	},
	#[error("Serve: {source}")]
	Serve {
		#[source]
		source: std::io::Error,
	},
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
	dotenvy::dotenv().ok();

	let config = Config::from_env().map_err(|source| MainError::Config { source })?;

	utils_trace::init(&config.log_level, config.log_format)
		.map_err(|source| MainError::TracingInit { source })?;

	let mailer = build_transport(&config.mail).map_err(|source| MainError::MailTransport { source })?;
	let star_store = FlatFileStore::open(&config.data_dir)
		.map_err(|source| MainError::OpenStore { source })?;
	let rate_limit_store = FlatFileStore::open(&config.rate_limit_dir)
		.map_err(|source| MainError::OpenStore { source })?;

	info!(
		bind = %config.bind_addr,
		data_dir = %config.data_dir.display(),
		rate_limit_dir = %config.rate_limit_dir.display(),
		cooldown_secs = config.contact_cooldown_secs,
		mail_transport = config.mail.backend.name(),
		"Starting site api"
	);

	let state = AppState::new(
		config,
		mailer,
		Arc::new(star_store),
		Arc::new(rate_limit_store),
	);
	let _sweeper = spawn_rate_limit_sweeper(&state);

	let bind_addr = state.config.bind_addr.clone();
	let app = build_router(state);

	let listener = tokio::net::TcpListener::bind(&bind_addr)
		.await
		.map_err(|source| MainError::TcpListenerBind { source })?;

	info!("Server running on addr: {}", bind_addr);

	serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
		.await
		.map_err(|source| MainError::Serve { source })?;

	Ok(())
}
