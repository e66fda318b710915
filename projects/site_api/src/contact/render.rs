use std::net::IpAddr;

use chrono::{DateTime, Utc};
use maud::{html, Markup};

use crate::contact::submission::{ContactSubmission, ModeratorDetails, SubmissionKind};
use crate::mail::{
    single_line,
    template::{info_row, multiline, render_document, Brand, EmailContent},
    OutboundMail,
};

/// The operator notification and the submitter's auto-reply.
#[derive(Debug, Clone)]
pub struct RenderedMails {
    pub admin: OutboundMail,
    pub auto_reply: OutboundMail,
}

pub fn render_mails(
    brand: &Brand,
    operator_address: &str,
    submission: &ContactSubmission,
    caller_address: IpAddr,
    sent_at: DateTime<Utc>,
) -> RenderedMails {
    let (admin_subject, admin_content) = admin_notification(submission, caller_address);
    let (reply_subject, reply_content) = auto_reply(brand, submission);

    RenderedMails {
        admin: OutboundMail {
            to: operator_address.to_string(),
            reply_to: Some(submission.email.clone()),
            subject: single_line(&admin_subject),
            html_body: render_document(brand, &admin_content, sent_at),
        },
        auto_reply: OutboundMail {
            to: submission.email.clone(),
            reply_to: Some(brand.mailbox.clone()),
            subject: single_line(&reply_subject),
            html_body: render_document(brand, &reply_content, sent_at),
        },
    }
}

fn admin_notification(submission: &ContactSubmission, caller_address: IpAddr) -> (String, EmailContent) {
    let name = &submission.name;
    let caller = caller_address.to_string();

    match &submission.moderator {
        Some(details) if submission.kind == SubmissionKind::Moderator => {
            let body = html! {
                div class="content-section" {
                    h2 class="section-title" { "Applicant Information" }
                    (info_row("Name", name))
                    (info_row("Email", &submission.email))
                    (moderator_rows(details))
                    (info_row("GitHub", &details.profile_url))
                }
                div class="content-section" {
                    h2 class="section-title" { "Application Reason" }
                    div class="message-box" { p { (multiline(&submission.message)) } }
                }
                div class="divider" {}
                div class="content-section" { (info_row("IP", &caller)) }
            };
            (
                format!("New moderator application — {name}"),
                EmailContent {
                    title: "New Moderator Application".to_string(),
                    body,
                    footer: None,
                },
            )
        }
        _ => {
            let body = html! {
                div class="content-section" {
                    h2 class="section-title" { "Sender Information" }
                    (info_row("Name", name))
                    div class="info-row" {
                        span class="info-label" { "Email" }
                        span class="info-value" {
                            a href={ "mailto:" (submission.email) } { (submission.email) }
                        }
                    }
                    (info_row("Subject", &submission.subject))
                }
                div class="content-section" {
                    h2 class="section-title" { "Message" }
                    div class="message-box" { p { (multiline(&submission.message)) } }
                }
                div style="text-align: center; margin: 30px 0;" {
                    a class="button" href={ "mailto:" (submission.email) } { "Reply now" }
                }
                div class="divider" {}
                div class="content-section" { (info_row("IP", &caller)) }
            };
            (
                format!("New contact form — {name}"),
                EmailContent {
                    title: "New Contact Form".to_string(),
                    body,
                    footer: None,
                },
            )
        }
    }
}

fn auto_reply(brand: &Brand, submission: &ContactSubmission) -> (String, EmailContent) {
    let site = &brand.site_name;

    let (subject, title, intro, window, echo) = match &submission.moderator {
        Some(details) if submission.kind == SubmissionKind::Moderator => (
            format!("{site} - Moderator Application Received"),
            "Moderator Application Received",
            format!("Thank you for applying to become a moderator for the {site} community!"),
            "Our team will review your application within 1-3 business days.",
            html! {
                p { strong { "Your application details" } }
                div class="message-box" { (moderator_rows(details)) }
            },
        ),
        _ => (
            format!("{site} - Message Received"),
            "Message Received",
            format!("Thank you for contacting {site}!"),
            "We typically respond within 24-48 hours.",
            html! {
                p { strong { "Your message" } }
                div class="message-box" { p { (multiline(&submission.message)) } }
            },
        ),
    };

    let body = html! {
        p { "Dear " strong { (submission.name) } "," }
        p { (intro) }
        div class="message-box" {
            p { "We have successfully received your submission." }
            p { (window) }
            p { "You will hear back from us by email." }
        }
        (echo)
        div class="divider" {}
        p { strong { "Best regards," } }
        p { strong { "The " (site) " Team" } }
    };

    (
        subject,
        EmailContent {
            title: title.to_string(),
            body,
            footer: Some(html! {
                p class="footer-text" { "For urgent matters, you can reply to this email directly." }
            }),
        },
    )
}

fn moderator_rows(details: &ModeratorDetails) -> Markup {
    html! {
        (info_row("Category", &details.category))
        (info_row("Experience", &details.experience))
        (info_row("Time commitment", &details.time_commitment))
    }
}
