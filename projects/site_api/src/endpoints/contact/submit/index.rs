use std::sync::Arc;

use axum::{
	body::Bytes,
	extract::State,
	http::{header::RETRY_AFTER, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::contact::{render::render_mails, submission::ContactPayload};
use crate::endpoints::caller::Caller;
use crate::mail::TransportError;
use crate::store::{
	rate_limit::{
		models::{RateDecision, RateLimitKey},
		queries::check_and_record,
	},
	StoreError,
};
use crate::AppState;

const SUCCESS_MESSAGE: &str = "Thank you for your message! We have received it and will reply soon.";
const PARTIAL_MESSAGE: &str = "Thank you for your message! We have received it, but the confirmation email could not be delivered.";

/// JSON body of every contact response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
	success: bool,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	retry_after: Option<u64>,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	partial: bool,
}

impl ContactResponse {
	pub fn failure(code: &'static str, message: impl Into<String>) -> Self {
		Self {
			success: false,
			message: message.into(),
			error: Some(code),
			retry_after: None,
			partial: false,
		}
	}
}

#[derive(Debug, Error)]
pub enum HandlerError {
	#[error("InvalidRequest: {source}")]
	InvalidRequest {
		#[source]
		source: serde_json::Error,
	},
	#[error("ValidationFailed: {}", .violations.join("; "))]
	ValidationFailed {
		violations: Vec<String>,
	},
	#[error("RateLimited: {remaining_secs}s remaining")]
	RateLimited {
		remaining_secs: u64,
	},
	#[error("StorageUnavailable: {source}")]
	StorageUnavailable {
		#[from]
		source: StoreError,
	},
	#[error("BlockingTask: {source}")]
	BlockingTask {
		#[from]
		source: tokio::task::JoinError,
	},
	#[error("MailDispatchFailed: {source}")]
	MailDispatchFailed {
		#[source]
		source: TransportError,
	},
}

impl IntoResponse for HandlerError {
	fn into_response(self) -> Response {
		match self {
			HandlerError::InvalidRequest { .. } => (
				StatusCode::BAD_REQUEST,
				Json(ContactResponse::failure("invalid_request", "Invalid request data")),
			)
				.into_response(),
			HandlerError::ValidationFailed { violations } => (
				StatusCode::BAD_REQUEST,
				Json(ContactResponse::failure("validation_failed", violations.join("; "))),
			)
				.into_response(),
			HandlerError::RateLimited { remaining_secs } => {
				let mut body = ContactResponse::failure(
					"rate_limited",
					format!("Too many submissions, please wait {remaining_secs} seconds before trying again."),
				);
				body.retry_after = Some(remaining_secs);
				(
					StatusCode::TOO_MANY_REQUESTS,
					[(RETRY_AFTER, HeaderValue::from(remaining_secs))],
					Json(body),
				)
					.into_response()
			}
			HandlerError::StorageUnavailable { .. } | HandlerError::BlockingTask { .. } => (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(ContactResponse::failure(
					"storage_unavailable",
					"Submissions are temporarily unavailable, please try again later.",
				)),
			)
				.into_response(),
			HandlerError::MailDispatchFailed { .. } => (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(ContactResponse::failure(
					"mail_dispatch_failed",
					"Failed to send your message, please try again later.",
				)),
			)
				.into_response(),
		}
	}
}

/// Result of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionOutcome {
	pub auto_reply_sent: bool,
}

impl IntoResponse for SubmissionOutcome {
	fn into_response(self) -> Response {
		let message = if self.auto_reply_sent { SUCCESS_MESSAGE } else { PARTIAL_MESSAGE };
		let body = ContactResponse {
			success: true,
			message: message.to_string(),
			error: None,
			retry_after: None,
			partial: !self.auto_reply_sent,
		};
		(StatusCode::OK, Json(body)).into_response()
	}
}

/// Axum handler: POST /api/contact
pub async fn handler(
	State(state): State<AppState>,
	caller: Caller,
	body: Bytes,
) -> impl IntoResponse {
	let payload: ContactPayload = match serde_json::from_slice(&body) {
		Ok(payload) => payload,
		Err(source) => return HandlerError::InvalidRequest { source }.into_response(),
	};

	match submit(&state, &caller, payload).await {
		Ok(outcome) => outcome.into_response(),
		Err(err) => err.into_response(),
	}
}

/// Validates, rate-limits, renders and dispatches one submission.
///
/// The cooldown slot is consumed before any mail leaves, so a failed
/// dispatch still counts against the sender.
pub async fn submit(
	state: &AppState,
	caller: &Caller,
	payload: ContactPayload,
) -> Result<SubmissionOutcome, HandlerError> {
	let submission = payload
		.validate()
		.map_err(|violations| HandlerError::ValidationFailed { violations })?;

	let now = Utc::now();
	let key = RateLimitKey::new(caller.address, &submission.email.to_lowercase());
	let store = Arc::clone(&state.rate_limit_store);
	let cooldown = state.config.contact_cooldown_secs;
	let decision = tokio::task::spawn_blocking(move || {
		check_and_record(store.as_ref(), &key, now.timestamp(), cooldown)
	})
	.await??;

	if let RateDecision::Limited { remaining_secs } = decision {
		warn!(address = %caller.address, remaining_secs, "contact submission rate limited");
		return Err(HandlerError::RateLimited { remaining_secs });
	}

	let mails = render_mails(
		&state.brand,
		&state.config.operator_address,
		&submission,
		caller.address,
		now,
	);

	if let Err(source) = state.mailer.send(&mails.admin).await {
		error!(error = %source, to = %mails.admin.to, "admin notification failed");
		return Err(HandlerError::MailDispatchFailed { source });
	}

	let auto_reply_sent = match state.mailer.send(&mails.auto_reply).await {
		Ok(()) => true,
		Err(err) => {
			warn!(error = %err, "auto-reply failed after admin notification");
			false
		}
	};

	info!(
		kind = ?submission.kind,
		address = %caller.address,
		auto_reply_sent,
		"contact submission delivered"
	);

	Ok(SubmissionOutcome { auto_reply_sent })
}
