//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::models::BookForm;

/// Field length limits for submitted book forms
pub const MAX_AUTHOR_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 300;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate the fields of a submitted book form
pub fn validate_book(form: &BookForm) -> Result<(), String> {
    if form.title.trim().is_empty() {
        return Err("Title is required".to_string());
    }

    if form.title.chars().count() > MAX_TITLE_LEN {
        return Err(format!(
            "Title must be at most {} characters long",
            MAX_TITLE_LEN
        ));
    }

    if form.author.chars().count() > MAX_AUTHOR_LEN {
        return Err(format!(
            "Author must be at most {} characters long",
            MAX_AUTHOR_LEN
        ));
    }

    if form.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(format!(
            "Description must be at most {} characters long",
            MAX_DESCRIPTION_LEN
        ));
    }

    Ok(())
}
