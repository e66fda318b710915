pub mod template;

use std::sync::Arc;

use async_trait::async_trait;
use interfaces_mail_postmark::index::{
    BuildPostmarkClientError, PostmarkClient, SendEmailError, SendEmailRequest,
};
use interfaces_mail_smtp::index::{
    BuildSmtpClientError, SendMessageError, SendMessageRequest, SmtpClient, SmtpLogin,
    SmtpSettings,
};
use thiserror::Error;

use crate::config::{MailBackend, MailConfig, SmtpConfig};

const MESSAGE_STREAM: &str = "outbound";

/// A rendered HTML message ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Postmark: {source}")]
    Postmark {
        #[from]
        source: SendEmailError,
    },
    #[error("Smtp: {source}")]
    Smtp {
        #[from]
        source: SendMessageError,
    },
}

#[derive(Debug, Error)]
pub enum BuildTransportError {
    #[error("Postmark: {source}")]
    Postmark {
        #[from]
        source: BuildPostmarkClientError,
    },
    #[error("Smtp: {source}")]
    Smtp {
        #[from]
        source: BuildSmtpClientError,
    },
}

/// Builds the transport selected by the mail configuration.
pub fn build_transport(config: &MailConfig) -> Result<Arc<dyn MailTransport>, BuildTransportError> {
    let transport: Arc<dyn MailTransport> = match &config.backend {
        MailBackend::Postmark {
            api_base_url,
            api_token,
        } => Arc::new(PostmarkTransport::new(config, api_base_url, api_token)?),
        MailBackend::Smtp(smtp) => Arc::new(SmtpTransport::new(config, smtp)?),
    };
    Ok(transport)
}

/// Delivers through the Postmark-style HTTP API.
pub struct PostmarkTransport {
    client: PostmarkClient,
    sender: String,
}

impl PostmarkTransport {
    pub fn new(
        config: &MailConfig,
        api_base_url: &str,
        api_token: &str,
    ) -> Result<Self, BuildPostmarkClientError> {
        let client = PostmarkClient::new(api_base_url, api_token, config.send_timeout)?;
        Ok(Self {
            client,
            sender: config.sender(),
        })
    }
}

#[async_trait]
impl MailTransport for PostmarkTransport {
    async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError> {
        let request = SendEmailRequest {
            from: &self.sender,
            to: &mail.to,
            reply_to: mail.reply_to.as_deref(),
            subject: &mail.subject,
            html_body: &mail.html_body,
            message_stream: MESSAGE_STREAM,
        };
        self.client.send_email(&request).await?;
        Ok(())
    }
}

/// Delivers through an SMTP relay.
pub struct SmtpTransport {
    client: SmtpClient,
}

impl SmtpTransport {
    pub fn new(config: &MailConfig, smtp: &SmtpConfig) -> Result<Self, BuildSmtpClientError> {
        let settings = SmtpSettings {
            host: &smtp.host,
            port: smtp.port,
            encryption: smtp.encryption,
            login: smtp.credentials.as_ref().map(|credentials| SmtpLogin {
                username: &credentials.username,
                password: &credentials.password,
            }),
            timeout: config.send_timeout,
        };
        let client = SmtpClient::new(&settings, &config.from_address, &config.from_name)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError> {
        let request = SendMessageRequest {
            to: &mail.to,
            reply_to: mail.reply_to.as_deref(),
            subject: &mail.subject,
            html_body: &mail.html_body,
        };
        self.client.send_message(&request).await?;
        Ok(())
    }
}

/// Mail subjects end up in a header; keep them on one line.
pub fn single_line(subject: &str) -> String {
    subject
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use interfaces_mail_smtp::index::SmtpEncryption;

    use super::*;

    fn mail_config(from_address: &str, backend: MailBackend) -> MailConfig {
        MailConfig {
            from_address: from_address.to_string(),
            from_name: "Linux Studio".to_string(),
            send_timeout: Duration::from_secs(30),
            backend,
        }
    }

    fn smtp_backend() -> MailBackend {
        MailBackend::Smtp(SmtpConfig {
            host: "127.0.0.1".to_string(),
            port: 2525,
            encryption: SmtpEncryption::Plain,
            credentials: None,
        })
    }

    #[test]
    fn transport_follows_configured_backend() {
        let postmark = MailBackend::Postmark {
            api_base_url: "http://127.0.0.1:9".to_string(),
            api_token: "token".to_string(),
        };
        assert!(build_transport(&mail_config("noreply@example.com", postmark)).is_ok());
        assert!(build_transport(&mail_config("noreply@example.com", smtp_backend())).is_ok());
    }

    #[test]
    fn smtp_sender_must_be_an_address() {
        let result = build_transport(&mail_config("noreply at example", smtp_backend()));
        assert!(matches!(result, Err(BuildTransportError::Smtp { .. })));
    }

    #[test]
    fn subjects_are_flattened() {
        assert_eq!(single_line("a\r\nBcc: b\nc"), "a  Bcc: b c");
    }
}
