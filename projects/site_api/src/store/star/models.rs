use serde::Serialize;

use crate::identity::CallerId;

pub const STAR_TOTAL_KEY: &str = "star_data.txt";
pub const STAR_USERS_KEY: &str = "star_users.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StarAction {
    Star,
    Unstar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarStatus {
    pub total: u64,
    pub starred: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarToggle {
    pub action: StarAction,
    pub total: u64,
    pub starred: bool,
}

impl StarToggle {
    pub fn message(&self) -> &'static str {
        match self.action {
            StarAction::Star => "Thanks for your star! ⭐",
            StarAction::Unstar => "Star removed",
        }
    }
}

pub fn parse_total(contents: &str) -> u64 {
    contents.trim().parse().unwrap_or(0)
}

/// Newline-delimited ids, blank lines and duplicates dropped, order kept.
pub fn parse_users(contents: &str) -> Vec<&str> {
    let mut users: Vec<&str> = Vec::new();
    for line in contents.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if !users.contains(&line) {
            users.push(line);
        }
    }
    users
}

pub fn render_users(users: &[&str]) -> String {
    let mut out = String::new();
    for user in users {
        out.push_str(user);
        out.push('\n');
    }
    out
}

pub fn is_member(contents: Option<&str>, user: &CallerId) -> bool {
    contents
        .map(|contents| parse_users(contents).contains(&user.as_str()))
        .unwrap_or(false)
}
