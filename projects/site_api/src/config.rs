//! Service configuration loaded from environment variables.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use interfaces_mail_smtp::index::SmtpEncryption;
use thiserror::Error;
use utils_trace::TraceFormat;

#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Directory holding the star counter files.
    pub data_dir: PathBuf,
    /// Directory holding one cooldown record per (address, email) pair.
    pub rate_limit_dir: PathBuf,
    /// Honour `X-Forwarded-For` / `X-Real-IP` when behind a reverse proxy.
    pub trust_forwarded_for: bool,
    /// Minimum time between accepted submissions per (address, email).
    pub contact_cooldown_secs: u64,
    /// Interval of the expired-record sweep. 0 disables it.
    pub rate_limit_sweep_secs: u64,
    pub operator_address: String,
    pub mail: MailConfig,
    pub site: SiteConfig,
    pub log_level: String,
    pub log_format: TraceFormat,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub from_address: String,
    pub from_name: String,
    pub send_timeout: Duration,
    pub backend: MailBackend,
}

/// Where outgoing mail is handed off, selected by `MAIL_TRANSPORT`.
#[derive(Clone, Debug)]
pub enum MailBackend {
    Postmark {
        api_base_url: String,
        api_token: String,
    },
    Smtp(SmtpConfig),
}

impl MailBackend {
    pub fn name(&self) -> &'static str {
        match self {
            MailBackend::Postmark { .. } => "postmark",
            MailBackend::Smtp(_) => "smtp",
        }
    }
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub encryption: SmtpEncryption,
    /// Relays that accept unauthenticated submission leave this unset.
    pub credentials: Option<SmtpCredentials>,
}

#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl MailConfig {
    /// `Name <address>` as used in the `From` field.
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_address)
    }
}

/// Branding used by the mail templates.
#[derive(Clone, Debug)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    pub github_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is required")]
    Missing {
        name: &'static str,
    },
    #[error("{name}='{value}' is invalid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing { name });
        let or_default = |name: &'static str, default: &str| {
            optional(name).unwrap_or_else(|| default.to_string())
        };

        let data_dir = PathBuf::from(or_default("SITE_API_DATA_DIR", "./data"));
        let rate_limit_dir = optional("SITE_API_RATE_LIMIT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("rate_limits"));

        let transport = or_default("MAIL_TRANSPORT", "postmark");
        let backend = match transport.trim().to_ascii_lowercase().as_str() {
            "postmark" => MailBackend::Postmark {
                api_base_url: or_default("MAIL_API_BASE_URL", "https://api.postmarkapp.com"),
                api_token: required("MAIL_API_TOKEN")?,
            },
            "smtp" => {
                let port = parse_var("SMTP_PORT", optional("SMTP_PORT"), 465u16)?;
                let credentials = match optional("SMTP_USERNAME") {
                    Some(username) => Some(SmtpCredentials {
                        username,
                        password: required("SMTP_PASSWORD")?,
                    }),
                    None => None,
                };
                MailBackend::Smtp(SmtpConfig {
                    host: required("SMTP_HOST")?,
                    port,
                    encryption: parse_var(
                        "SMTP_ENCRYPTION",
                        optional("SMTP_ENCRYPTION"),
                        SmtpEncryption::for_port(port),
                    )?,
                    credentials,
                })
            }
            _ => {
                return Err(ConfigError::Invalid {
                    name: "MAIL_TRANSPORT",
                    value: transport,
                    reason: "expected 'postmark' or 'smtp'".to_string(),
                })
            }
        };

        let mail = MailConfig {
            backend,
            from_address: required("MAIL_FROM_ADDRESS")?,
            from_name: or_default("MAIL_FROM_NAME", "Linux Studio"),
            send_timeout: Duration::from_secs(parse_var(
                "MAIL_SEND_TIMEOUT_SECS",
                optional("MAIL_SEND_TIMEOUT_SECS"),
                30,
            )?),
        };

        let site = SiteConfig {
            name: mail.from_name.clone(),
            url: or_default("SITE_URL", "https://linuxstudio.dev"),
            github_url: or_default("SITE_GITHUB_URL", "https://github.com/linuxstudio"),
        };

        Ok(Config {
            bind_addr: or_default("SITE_API_BIND_ADDR", "0.0.0.0:8000"),
            data_dir,
            rate_limit_dir,
            trust_forwarded_for: parse_var(
                "SITE_API_TRUST_FORWARDED",
                optional("SITE_API_TRUST_FORWARDED"),
                false,
            )?,
            contact_cooldown_secs: parse_var(
                "CONTACT_COOLDOWN_SECS",
                optional("CONTACT_COOLDOWN_SECS"),
                300,
            )?,
            rate_limit_sweep_secs: parse_var(
                "RATE_LIMIT_SWEEP_SECS",
                optional("RATE_LIMIT_SWEEP_SECS"),
                3600,
            )?,
            operator_address: required("CONTACT_OPERATOR_ADDRESS")?,
            mail,
            site,
            log_level: or_default("LOG_LEVEL", "info"),
            log_format: parse_var("LOG_FORMAT", optional("LOG_FORMAT"), TraceFormat::Compact)?,
        })
    }
}

fn parse_var<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            name,
            reason: err.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("MAIL_API_TOKEN", "token"),
        ("MAIL_FROM_ADDRESS", "noreply@example.com"),
        ("CONTACT_OPERATOR_ADDRESS", "ops@example.com"),
    ];

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.contact_cooldown_secs, 300);
        assert_eq!(config.rate_limit_sweep_secs, 3600);
        assert_eq!(config.mail.send_timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit_dir, PathBuf::from("./data").join("rate_limits"));
        assert!(!config.trust_forwarded_for);
        assert_eq!(config.log_format, TraceFormat::Compact);
        assert_eq!(config.mail.sender(), "Linux Studio <noreply@example.com>");
        assert_eq!(config.mail.backend.name(), "postmark");
    }

    #[test]
    fn missing_operator_address_is_reported() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing { name: "CONTACT_OPERATOR_ADDRESS" }
        ));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CONTACT_COOLDOWN_SECS", "five minutes"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CONTACT_COOLDOWN_SECS", .. }));
    }

    #[test]
    fn smtp_transport_defaults_encryption_from_port() {
        let pairs = [
            ("MAIL_TRANSPORT", "smtp"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USERNAME", "mailer@example.com"),
            ("SMTP_PASSWORD", "hunter2"),
            ("MAIL_FROM_ADDRESS", "noreply@example.com"),
            ("CONTACT_OPERATOR_ADDRESS", "ops@example.com"),
        ];
        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        match &config.mail.backend {
            MailBackend::Smtp(smtp) => {
                assert_eq!(smtp.host, "smtp.example.com");
                assert_eq!(smtp.port, 465);
                assert_eq!(smtp.encryption, SmtpEncryption::Implicit);
                let credentials = smtp.credentials.as_ref().unwrap();
                assert_eq!(credentials.username, "mailer@example.com");
                assert!(!format!("{credentials:?}").contains("hunter2"));
            }
            other => panic!("unexpected backend: {other:?}"),
        }

        let mut pairs = pairs.to_vec();
        pairs.retain(|(name, _)| !matches!(*name, "SMTP_USERNAME" | "SMTP_PASSWORD"));
        pairs.push(("SMTP_PORT", "587"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        match &config.mail.backend {
            MailBackend::Smtp(smtp) => {
                assert_eq!(smtp.encryption, SmtpEncryption::StartTls);
                assert!(smtp.credentials.is_none());
            }
            other => panic!("unexpected backend: {other:?}"),
        }
    }

    #[test]
    fn smtp_transport_requires_host_and_password() {
        let base = [
            ("MAIL_TRANSPORT", "smtp"),
            ("MAIL_FROM_ADDRESS", "noreply@example.com"),
            ("CONTACT_OPERATOR_ADDRESS", "ops@example.com"),
        ];
        let err = Config::from_lookup(lookup(&base)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { name: "SMTP_HOST" }));

        let mut pairs = base.to_vec();
        pairs.extend([("SMTP_HOST", "smtp.example.com"), ("SMTP_USERNAME", "mailer")]);
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { name: "SMTP_PASSWORD" }));
    }

    #[test]
    fn unknown_transport_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MAIL_TRANSPORT", "pigeon"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAIL_TRANSPORT", .. }));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("SITE_API_TRUST_FORWARDED", "true"),
            ("SITE_API_RATE_LIMIT_DIR", "/tmp/limits"),
            ("LOG_FORMAT", "json"),
            ("MAIL_SEND_TIMEOUT_SECS", "5"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert!(config.trust_forwarded_for);
        assert_eq!(config.rate_limit_dir, PathBuf::from("/tmp/limits"));
        assert_eq!(config.log_format, TraceFormat::Json);
        assert_eq!(config.mail.send_timeout, Duration::from_secs(5));
    }
}
