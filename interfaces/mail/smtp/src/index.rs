use std::str::FromStr;
use std::time::Duration;

use lettre::{
    address::AddressError,
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

/// How the connection to the relay is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpEncryption {
    /// TLS from the first byte (SMTPS).
    Implicit,
    StartTls,
    Plain,
}

impl SmtpEncryption {
    /// 465 is SMTPS, 587 is submission with STARTTLS, anything else is unencrypted.
    pub fn for_port(port: u16) -> Self {
        match port {
            465 => SmtpEncryption::Implicit,
            587 => SmtpEncryption::StartTls,
            _ => SmtpEncryption::Plain,
        }
    }
}

impl FromStr for SmtpEncryption {
    type Err = ParseSmtpEncryptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ssl" | "smtps" | "implicit" => Ok(SmtpEncryption::Implicit),
            "starttls" | "tls" => Ok(SmtpEncryption::StartTls),
            "none" | "plain" => Ok(SmtpEncryption::Plain),
            _ => Err(ParseSmtpEncryptionError {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown SMTP encryption '{value}', expected 'ssl', 'starttls' or 'none'")]
pub struct ParseSmtpEncryptionError {
    pub value: String,
}

#[derive(Debug, Clone, Copy)]
pub struct SmtpLogin<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct SmtpSettings<'a> {
    pub host: &'a str,
    pub port: u16,
    pub encryption: SmtpEncryption,
    pub login: Option<SmtpLogin<'a>>,
    pub timeout: Duration,
}

/// A single HTML message.
#[derive(Debug)]
pub struct SendMessageRequest<'a> {
    pub to: &'a str,
    pub reply_to: Option<&'a str>,
    pub subject: &'a str,
    pub html_body: &'a str,
}

pub struct SmtpClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpClient {
    pub fn new(
        settings: &SmtpSettings<'_>,
        from_address: &str,
        from_name: &str,
    ) -> Result<Self, BuildSmtpClientError> {
        let address: Address = from_address
            .parse()
            .map_err(|source| BuildSmtpClientError::SenderAddress { source })?;
        let sender = Mailbox::new(Some(from_name.to_string()), address);

        let mut builder = match settings.encryption {
            SmtpEncryption::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(settings.host)
                .map_err(|source| BuildSmtpClientError::Relay { source })?,
            SmtpEncryption::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(settings.host)
                    .map_err(|source| BuildSmtpClientError::Relay { source })?
            }
            SmtpEncryption::Plain => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(settings.host),
        }
        .port(settings.port)
        .timeout(Some(settings.timeout));

        if let Some(login) = settings.login {
            builder = builder.credentials(Credentials::new(
                login.username.to_string(),
                login.password.to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }

    pub async fn send_message(&self, request: &SendMessageRequest<'_>) -> Result<(), SendMessageError> {
        let to: Mailbox = request
            .to
            .parse()
            .map_err(|source| SendMessageError::RecipientAddress { source })?;

        let mut builder = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(request.subject)
            .header(ContentType::TEXT_HTML);
        if let Some(reply_to) = request.reply_to {
            let reply_to: Mailbox = reply_to
                .parse()
                .map_err(|source| SendMessageError::RecipientAddress { source })?;
            builder = builder.reply_to(reply_to);
        }

        let message = builder
            .body(request.html_body.to_string())
            .map_err(|source| SendMessageError::BuildMessage { source })?;

        self.transport
            .send(message)
            .await
            .map_err(|source| SendMessageError::Deliver { source })?;

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum BuildSmtpClientError {
    #[error("SenderAddress: {source}")]
    SenderAddress {
        source: AddressError,
    },

    #[error("Relay: {source}")]
    Relay {
        source: lettre::transport::smtp::Error,
    },
}

#[derive(Debug, Error)]
pub enum SendMessageError {
    #[error("RecipientAddress: {source}")]
    RecipientAddress {
        source: AddressError,
    },

    #[error("BuildMessage: {source}")]
    BuildMessage {
        source: lettre::error::Error,
    },

    #[error("Deliver: {source}")]
    Deliver {
        source: lettre::transport::smtp::Error,
    },
}
