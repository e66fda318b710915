use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::store::{rate_limit::queries::sweep_expired, Store};
use crate::AppState;

/// Periodically deletes cooldown records older than the window.
/// Returns `None` when the sweep interval is configured as 0.
pub fn spawn_rate_limit_sweeper(state: &AppState) -> Option<JoinHandle<()>> {
	let every = state.config.rate_limit_sweep_secs;
	if every == 0 {
		return None;
	}
	let store = Arc::clone(&state.rate_limit_store);
	let cooldown = state.config.contact_cooldown_secs;

	Some(tokio::spawn(async move {
		let mut ticker = tokio::time::interval(Duration::from_secs(every));
		loop {
			ticker.tick().await;
			match sweep_once(Arc::clone(&store), cooldown).await {
				Ok(0) => {}
				Ok(removed) => info!(removed, "expired rate-limit records swept"),
				Err(err) => warn!(error = %format!("{err:#}"), "rate-limit sweep failed"),
			}
		}
	}))
}

pub async fn sweep_once(store: Arc<dyn Store>, cooldown_secs: u64) -> anyhow::Result<usize> {
	let now = Utc::now().timestamp();
	let removed = tokio::task::spawn_blocking(move || sweep_expired(store.as_ref(), now, cooldown_secs))
		.await
		.context("sweep task panicked")?
		.context("sweeping rate-limit store")?;
	Ok(removed)
}
