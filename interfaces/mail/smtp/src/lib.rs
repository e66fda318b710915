//! Client for an authenticated SMTP relay.
//!
//! - `index::SmtpClient` delivers single HTML messages over SMTPS, STARTTLS or plain SMTP
//! - The encryption mode defaults from the port (465 SMTPS, 587 STARTTLS)

pub mod index;
