#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use interfaces_mail_postmark::index::SendEmailError;
use parking_lot::Mutex;
use projects_site_api::{
    build_router,
    config::{Config, MailBackend, MailConfig, SiteConfig},
    mail::{MailTransport, OutboundMail, TransportError},
    store::FlatFileStore,
    AppState,
};
use tempfile::TempDir;
use utils_trace::TraceFormat;

pub const OPERATOR: &str = "ops@example.com";

/// Records every mail; can be told to fail the n-th send.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMail>>,
    fail_on: Mutex<Vec<usize>>,
    attempts: Mutex<usize>,
}

impl RecordingTransport {
    pub fn failing_on(attempts: &[usize]) -> Self {
        Self {
            fail_on: Mutex::new(attempts.to_vec()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundMail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            *attempts += 1;
            *attempts
        };
        if self.fail_on.lock().contains(&attempt) {
            return Err(TransportError::Postmark {
                source: SendEmailError::Rejected {
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    body: format!("relay refused attempt {attempt}"),
                },
            });
        }
        self.sent.lock().push(mail.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub transport: Arc<RecordingTransport>,
    pub data_dir: PathBuf,
    pub rate_limit_dir: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        data_dir: dir.path().join("data"),
        rate_limit_dir: dir.path().join("rate_limits"),
        trust_forwarded_for: true,
        contact_cooldown_secs: 300,
        rate_limit_sweep_secs: 0,
        operator_address: OPERATOR.to_string(),
        mail: MailConfig {
            from_address: "noreply@example.com".to_string(),
            from_name: "Linux Studio".to_string(),
            send_timeout: Duration::from_secs(30),
            backend: MailBackend::Postmark {
                api_base_url: "http://127.0.0.1:9".to_string(),
                api_token: "test-token".to_string(),
            },
        },
        site: SiteConfig {
            name: "Linux Studio".to_string(),
            url: "https://linuxstudio.dev".to_string(),
            github_url: "https://github.com/linuxstudio".to_string(),
        },
        log_level: "info".to_string(),
        log_format: TraceFormat::Compact,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(RecordingTransport::default()).await
}

pub async fn spawn_app_with(transport: RecordingTransport) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(&dir);
    let data_dir = config.data_dir.clone();
    let rate_limit_dir = config.rate_limit_dir.clone();

    let star_store = FlatFileStore::open(&config.data_dir).expect("star store");
    let rate_limit_store = FlatFileStore::open(&config.rate_limit_dir).expect("rate limit store");
    let transport = Arc::new(transport);
    let state = AppState::new(
        config,
        transport.clone(),
        Arc::new(star_store),
        Arc::new(rate_limit_store),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .expect("serve");
    });

    TestApp {
        base_url: format!("http://{addr}"),
        client: reqwest::Client::new(),
        transport,
        data_dir,
        rate_limit_dir,
        _dir: dir,
    }
}
