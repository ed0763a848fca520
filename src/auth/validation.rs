//! Shape checks for the `{email, password}` body shared by signup and login.

use std::sync::OnceLock;

use regex::Regex;

pub const INVALID_EMAIL: &str = "email must be an email";
pub const WEAK_PASSWORD: &str = "password is not strong enough";

const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

/// Local part, `@`, then at least two dot-separated DNS labels.
fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
        )
        .expect("Invalid email regex")
    })
}

pub fn is_email(value: &str) -> bool {
    value.len() <= 254 && email_regex().is_match(value)
}

/// At least eight characters with a lowercase letter, an uppercase letter, a
/// digit and a symbol.
pub fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= MIN_PASSWORD_LEN
        && value.chars().any(|c| c.is_lowercase())
        && value.chars().any(|c| c.is_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

/// Every violated rule, in field order. Empty when the body is acceptable.
pub fn credential_violations(email: &str, password: &str) -> Vec<String> {
    let mut violations = Vec::new();
    if !is_email(email.trim()) {
        violations.push(INVALID_EMAIL.to_string());
    }
    if !is_strong_password(password) {
        violations.push(WEAK_PASSWORD.to_string());
    }
    violations
}
