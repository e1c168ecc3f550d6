//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

const MAX_DESCRIPTION_CHARS: usize = 2000;
const MAX_POST_IMAGE_CHARS: usize = 2048;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    let username = username.trim();
    let len = username.chars().count();

    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if len < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if len > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[\p{L}\p{N}_.\- ]+$").expect("Failed to compile username regex")
    });

    if !regex.is_match(username) {
        return Err(
            "Username can only contain letters, numbers, spaces, dots, dashes and underscores"
                .to_string(),
        );
    }

    Ok(())
}

/// Validate the optional login handle
pub fn validate_login(login: &str) -> Result<(), String> {
    if login.trim().chars().count() > 32 {
        return Err("Login must be at most 32 characters long".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();

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

/// Emails are compared case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let len = password.chars().count();

    if len < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    if len > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate the image reference of a post
pub fn validate_post_image(post_image: &str) -> Result<(), String> {
    if post_image.trim().is_empty() {
        return Err("Post image is required".to_string());
    }

    if post_image.chars().count() > MAX_POST_IMAGE_CHARS {
        return Err(format!(
            "Post image reference must be at most {} characters long",
            MAX_POST_IMAGE_CHARS
        ));
    }

    Ok(())
}

/// Validate the description of a post
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.trim().is_empty() {
        return Err("Description is required".to_string());
    }

    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(format!(
            "Description must be at most {} characters long",
            MAX_DESCRIPTION_CHARS
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(validate_username("ana").is_ok());
        assert!(validate_username("Maker João_2").is_ok());
        assert!(validate_username("  ").is_err());
        assert!(validate_username("al").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("ana<script>").is_err());
    }

    #[test]
    fn logins() {
        assert!(validate_login("ana_maker").is_ok());
        assert!(validate_login(&"x".repeat(33)).is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("ana@x.com").is_ok());
        assert!(validate_email(" ana@x.com ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("ana").is_err());
        assert!(validate_email("ana@x").is_err());
        assert_eq!(normalize_email(" Ana@X.com "), "ana@x.com");
    }

    #[test]
    fn passwords() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("abc").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn post_fields() {
        assert!(validate_post_image("u1").is_ok());
        assert!(validate_post_image(" ").is_err());
        assert!(validate_description("hi").is_ok());
        assert!(validate_description("").is_err());
        assert!(validate_description(&"d".repeat(2001)).is_err());
    }
}
