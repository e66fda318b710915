use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;

pub struct PostmarkClient {
    http: Client,
    base_url: String,
    server_token: String,
}

/// A single HTML message as accepted by the `/email` endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendEmailRequest<'a> {
    pub from: &'a str,
    pub to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<&'a str>,
    pub subject: &'a str,
    pub html_body: &'a str,
    pub message_stream: &'a str,
}

impl PostmarkClient {
    pub fn new(
        base_url: &str,
        server_token: &str,
        timeout: Duration,
    ) -> Result<Self, BuildPostmarkClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| BuildPostmarkClientError::BuildHttpClient { source })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            server_token: server_token.to_string(),
        })
    }

    pub async fn send_email(&self, request: &SendEmailRequest<'_>) -> Result<(), SendEmailError> {
        let response = self
            .http
            .post(format!("{}/email", self.base_url))
            .header("X-Postmark-Server-Token", &self.server_token)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|source| SendEmailError::RequestSend { source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|source| SendEmailError::ResponseRead { source })?;

        Err(SendEmailError::Rejected { status, body })
    }
}

#[derive(Debug, Error)]
pub enum BuildPostmarkClientError {
    #[error("BuildHttpClient: {source}")]
    BuildHttpClient {
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum SendEmailError {
    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("ResponseRead: {source}")]
    ResponseRead {
        source: reqwest::Error,
    },

    #[error("Rejected with {status}: {body}")]
    Rejected {
        status: StatusCode,
        body: String,
    },
}
