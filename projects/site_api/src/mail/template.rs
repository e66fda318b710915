//! Shared chrome of every outgoing mail.
//!
//! All interpolated values go through maud, which escapes them; only the
//! stylesheet is emitted pre-escaped.

use chrono::{DateTime, Utc};
use maud::{html, Markup, PreEscaped, DOCTYPE};

/// Header, footer and link targets shared by all mails.
#[derive(Debug, Clone)]
pub struct Brand {
    pub site_name: String,
    pub site_url: String,
    pub github_url: String,
    pub mailbox: String,
}

/// Per-mail content placed inside the chrome.
pub struct EmailContent {
    pub title: String,
    pub body: Markup,
    pub footer: Option<Markup>,
}

pub fn render_document(brand: &Brand, content: &EmailContent, sent_at: DateTime<Utc>) -> String {
    let document = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (content.title) }
                style { (PreEscaped(STYLESHEET)) }
            }
            body {
                div class="email-container" {
                    div class="email-header" {
                        div class="logo-container" {
                            div class="logo-icon" { "🐧" }
                            div class="logo-text" { (brand.site_name) }
                        }
                        div class="email-title" { (content.title) }
                    }
                    div class="email-body" {
                        (content.body)
                    }
                    div class="email-footer" {
                        p class="footer-text" { "This email was sent automatically by " (brand.site_name) }
                        p class="footer-text" { (sent_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()) }
                        @if let Some(footer) = &content.footer {
                            (footer)
                        }
                        div class="footer-links" {
                            a href=(brand.site_url) { "Website" }
                            a href=(brand.github_url) { "GitHub" }
                            a href={ "mailto:" (brand.mailbox) } { "Contact" }
                        }
                    }
                }
            }
        }
    };
    document.into_string()
}

/// Renders multi-line user text with its line breaks kept.
pub fn multiline(text: &str) -> Markup {
    html! {
        @for (index, line) in text.lines().enumerate() {
            @if index > 0 { br; }
            (line)
        }
    }
}

/// One label/value line of an info block.
pub fn info_row(label: &str, value: &str) -> Markup {
    html! {
        div class="info-row" {
            span class="info-label" { (label) }
            span class="info-value" { (value) }
        }
    }
}

const STYLESHEET: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 40px 20px; }
.email-container { max-width: 600px; margin: 0 auto; background: #ffffff; border-radius: 16px; overflow: hidden; box-shadow: 0 20px 60px rgba(0, 0, 0, 0.3); }
.email-header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 40px 30px; text-align: center; }
.logo-container { display: flex; align-items: center; justify-content: center; gap: 12px; margin-bottom: 16px; }
.logo-icon { width: 48px; height: 48px; background: rgba(255, 255, 255, 0.2); border-radius: 12px; display: flex; align-items: center; justify-content: center; font-size: 24px; }
.logo-text { font-size: 28px; font-weight: 800; color: #ffffff; letter-spacing: -0.5px; }
.email-title { font-size: 24px; font-weight: 600; color: #ffffff; margin-top: 8px; }
.email-body { padding: 40px 30px; color: #1f2937; line-height: 1.8; }
.content-section { margin-bottom: 24px; }
.section-title { font-size: 18px; font-weight: 600; color: #667eea; margin-bottom: 12px; padding-bottom: 8px; border-bottom: 2px solid #e5e7eb; }
.info-row { display: flex; padding: 12px 0; border-bottom: 1px solid #f3f4f6; }
.info-label { font-weight: 600; color: #6b7280; min-width: 100px; }
.info-value { color: #1f2937; flex: 1; }
.message-box { background: #f9fafb; border-left: 4px solid #667eea; padding: 20px; border-radius: 8px; margin: 20px 0; }
.message-box p { color: #374151; line-height: 1.8; }
.button { display: inline-block; padding: 14px 32px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #ffffff; text-decoration: none; border-radius: 8px; font-weight: 600; margin: 20px 0; }
.email-footer { background: #f9fafb; padding: 30px; text-align: center; border-top: 1px solid #e5e7eb; }
.footer-text { color: #6b7280; font-size: 14px; margin-bottom: 8px; }
.footer-links { margin-top: 16px; }
.footer-links a { color: #667eea; text-decoration: none; margin: 0 12px; font-size: 14px; }
.divider { height: 1px; background: linear-gradient(90deg, transparent, #e5e7eb, transparent); margin: 30px 0; }
@media only screen and (max-width: 600px) { .email-body { padding: 30px 20px; } .email-header { padding: 30px 20px; } }
"#;

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn brand() -> Brand {
        Brand {
            site_name: "Linux Studio".to_string(),
            site_url: "https://linuxstudio.dev".to_string(),
            github_url: "https://github.com/linuxstudio".to_string(),
            mailbox: "noreply@example.com".to_string(),
        }
    }

    #[test]
    fn chrome_wraps_body_and_stamps_time() {
        let content = EmailContent {
            title: "Message Received".to_string(),
            body: html! { p { "hello" } },
            footer: None,
        };
        let sent_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();

        let doc = render_document(&brand(), &content, sent_at);

        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Message Received</title>"));
        assert!(doc.contains("<p>hello</p>"));
        assert!(doc.contains("2026-03-01 09:30:00 UTC"));
        assert!(doc.contains("mailto:noreply@example.com"));
    }

    #[test]
    fn user_text_is_escaped_and_keeps_line_breaks() {
        let rendered = multiline("<script>alert(1)</script>\nsecond & last").into_string();
        assert_eq!(
            rendered,
            "&lt;script&gt;alert(1)&lt;/script&gt;<br>second &amp; last"
        );
    }
}
