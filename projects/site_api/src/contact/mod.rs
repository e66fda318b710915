//! Contact and moderator-application form: validation and mail rendering.

pub mod render;
pub mod submission;
