use serde::Deserialize;
use validator::ValidateEmail;

const MIN_NAME_CHARS: usize = 2;
const MIN_CONTACT_MESSAGE_CHARS: usize = 10;
const MIN_MODERATOR_REASON_CHARS: usize = 20;
const DEFAULT_SUBJECT: &str = "General inquiry";
const NOT_PROVIDED: &str = "Not provided";

/// JSON body as posted by the site. Every field is optional at this level.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub category: Option<String>,
    pub experience: Option<String>,
    pub time: Option<String>,
    pub github: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Contact,
    Moderator,
}

impl SubmissionKind {
    fn from_payload(kind: Option<&str>) -> Self {
        match kind.map(str::trim) {
            Some("moderator") => SubmissionKind::Moderator,
            _ => SubmissionKind::Contact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeratorDetails {
    pub category: String,
    pub experience: String,
    pub time_commitment: String,
    pub profile_url: String,
}

/// A submission that passed validation. Fields are trimmed, not escaped;
/// escaping happens at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub kind: SubmissionKind,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub moderator: Option<ModeratorDetails>,
}

impl ContactPayload {
    /// Validates every field and reports all violations at once.
    pub fn validate(self) -> Result<ContactSubmission, Vec<String>> {
        let kind = SubmissionKind::from_payload(self.kind.as_deref());
        let name = trimmed(self.name);
        let email = trimmed(self.email);
        let message = trimmed(self.message);

        let mut violations = Vec::new();
        if name.chars().count() < MIN_NAME_CHARS {
            violations.push(format!("Name must be at least {MIN_NAME_CHARS} characters"));
        }
        if email.is_empty() || !email.validate_email() {
            violations.push("Please provide a valid email address".to_string());
        }
        let message_chars = message.chars().count();
        match kind {
            SubmissionKind::Moderator if message_chars < MIN_MODERATOR_REASON_CHARS => {
                violations.push(format!(
                    "Application reason must be at least {MIN_MODERATOR_REASON_CHARS} characters"
                ));
            }
            SubmissionKind::Contact if message_chars < MIN_CONTACT_MESSAGE_CHARS => {
                violations.push(format!(
                    "Message must be at least {MIN_CONTACT_MESSAGE_CHARS} characters"
                ));
            }
            _ => {}
        }
        if !violations.is_empty() {
            return Err(violations);
        }

        let subject = Some(trimmed(self.subject))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

        let moderator = (kind == SubmissionKind::Moderator).then(|| ModeratorDetails {
            category: or_not_provided(self.category),
            experience: or_not_provided(self.experience),
            time_commitment: or_not_provided(self.time),
            profile_url: or_not_provided(self.github),
        });

        Ok(ContactSubmission {
            kind,
            name,
            email,
            subject,
            message,
            moderator,
        })
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn or_not_provided(value: Option<String>) -> String {
    Some(trimmed(value))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_PROVIDED.to_string())
}
