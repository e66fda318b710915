use std::sync::Arc;

use axum::{
	body::Bytes,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::endpoints::caller::Caller;
use crate::identity::CallerId;
use crate::store::{
	star::{models::StarAction, queries::toggle_star},
	StoreError,
};
use crate::AppState;

/// Optional body of a toggle. Anything unparseable counts as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarToggleRequest {
	#[serde(default)]
	user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarToggleResponse {
	success: bool,
	action: StarAction,
	total_stars: u64,
	user_starred: bool,
	message: &'static str,
}

#[derive(Debug, Error)]
pub enum HandlerError {
	#[error("ToggleStar: {source}")]
	ToggleStar {
		#[from]
		source: StoreError,
	},
	#[error("BlockingTask: {source}")]
	BlockingTask {
		#[from]
		source: tokio::task::JoinError,
	},
}

impl IntoResponse for HandlerError {
	fn into_response(self) -> Response {
		error!(error = %self, "star toggle failed");
		(
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(json!({
				"success": false,
				"message": "Star state could not be updated, please try again later.",
			})),
		)
			.into_response()
	}
}

/// Axum handler: POST /api/star
pub async fn handler(
	State(state): State<AppState>,
	caller: Caller,
	body: Bytes,
) -> Result<impl IntoResponse, HandlerError> {
	let request: StarToggleRequest = serde_json::from_slice(&body).unwrap_or_default();
	let user = request
		.user_id
		.as_deref()
		.and_then(CallerId::from_client)
		.unwrap_or_else(|| caller.id());

	let store = Arc::clone(&state.star_store);
	let toggle_user = user.clone();
	let toggle = tokio::task::spawn_blocking(move || toggle_star(store.as_ref(), &toggle_user)).await??;

	info!(user = %user, action = ?toggle.action, total = toggle.total, "star toggled");

	Ok((
		StatusCode::OK,
		Json(StarToggleResponse {
			success: true,
			action: toggle.action,
			total_stars: toggle.total,
			user_starred: toggle.starred,
			message: toggle.message(),
		}),
	))
}
