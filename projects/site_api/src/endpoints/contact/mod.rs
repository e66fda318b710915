pub mod submit;

use axum::{http::StatusCode, response::IntoResponse, Json};

use submit::index::ContactResponse;

/// Axum handler: OPTIONS /api/contact
///
/// Browser preflights are answered by the CORS layer; this covers bare OPTIONS.
pub async fn preflight() -> StatusCode {
	StatusCode::OK
}

/// Any other method on /api/contact.
pub async fn method_not_allowed() -> impl IntoResponse {
	(
		StatusCode::METHOD_NOT_ALLOWED,
		Json(ContactResponse::failure(
			"method_not_allowed",
			"This API only accepts POST requests. Please submit the form from the website.",
		)),
	)
}
