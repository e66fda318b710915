pub mod status;
pub mod toggle;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Any method other than GET and POST on /api/star.
pub async fn unsupported_method() -> impl IntoResponse {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(json!({
			"success": false,
			"message": "Unsupported request method",
		})),
	)
}
