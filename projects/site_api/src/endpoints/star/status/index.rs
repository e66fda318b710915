use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::warn;

use crate::endpoints::caller::Caller;
use crate::identity::CallerId;
use crate::store::star::{models::StarStatus, queries::read_star_status};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarStatusResponse {
	success: bool,
	total_stars: u64,
	user_starred: bool,
	user_id: CallerId,
}

/// Axum handler: GET /api/star
pub async fn handler(State(state): State<AppState>, caller: Caller) -> impl IntoResponse {
	let user = caller.id();
	let store = Arc::clone(&state.star_store);
	let lookup_user = user.clone();

	// Never fails: a broken store reads as an empty counter.
	let status = tokio::task::spawn_blocking(move || read_star_status(store.as_ref(), &lookup_user))
		.await
		.unwrap_or_else(|err| {
			warn!(error = %err, "star status task failed, reporting empty counter");
			StarStatus { total: 0, starred: false }
		});

	(
		StatusCode::OK,
		Json(StarStatusResponse {
			success: true,
			total_stars: status.total,
			user_starred: status.starred,
			user_id: user,
		}),
	)
}
