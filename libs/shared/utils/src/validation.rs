// Field validators shared by every form-backed endpoint.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use shared_models::error::{AppError, FieldError};

pub const MIN_APPOINTMENT_DURATION: i64 = 5;
pub const MAX_APPOINTMENT_DURATION: i64 = 240;
pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9 ().\-]+$").expect("phone pattern compiles")
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern compiles")
});

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("time pattern compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    if !PHONE_RE.is_match(phone) {
        return false;
    }
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    (10..=15).contains(&digits)
}

pub fn is_valid_date(date: &str) -> bool {
    parse_date(date).is_some()
}

pub fn is_valid_time(time: &str) -> bool {
    parse_time(time).is_some()
}

pub fn is_valid_duration(minutes: i64) -> bool {
    (MIN_APPOINTMENT_DURATION..=MAX_APPOINTMENT_DURATION).contains(&minutes)
}

/// Strict `YYYY-MM-DD`, rejecting impossible dates such as `2024-13-01`.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    if !DATE_RE.is_match(date) {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Strict 24h `HH:MM`.
pub fn parse_time(time: &str) -> Option<NaiveTime> {
    if !TIME_RE.is_match(time) {
        return None;
    }
    NaiveTime::parse_from_str(time, "%H:%M").ok()
}

pub fn password_issues(password: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        issues.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        issues.push("Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        issues.push("Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("Password must contain a digit");
    }

    issues
}

pub fn is_valid_password(password: &str) -> bool {
    password_issues(password).is_empty()
}

/// Accumulates per-field messages and turns them into a single
/// `AppError::Validation`.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn required(&mut self, value: &str, field: &str) {
        if value.trim().is_empty() {
            self.add(field, &format!("{} is required", field));
        }
    }

    pub fn email(&mut self, value: &str, field: &str) {
        self.check(is_valid_email(value), field, "Invalid email address");
    }

    pub fn phone(&mut self, value: &str, field: &str) {
        self.check(is_valid_phone(value), field, "Invalid phone number");
    }

    pub fn date(&mut self, value: &str, field: &str) -> Option<NaiveDate> {
        let parsed = parse_date(value);
        self.check(parsed.is_some(), field, "Invalid date, expected YYYY-MM-DD");
        parsed
    }

    pub fn time(&mut self, value: &str, field: &str) -> Option<NaiveTime> {
        let parsed = parse_time(value);
        self.check(parsed.is_some(), field, "Invalid time, expected HH:MM");
        parsed
    }

    pub fn duration(&mut self, minutes: i64, field: &str) {
        self.check(
            is_valid_duration(minutes),
            field,
            "Duration must be between 5 and 240 minutes",
        );
    }

    pub fn password(&mut self, value: &str, field: &str) {
        for issue in password_issues(value) {
            self.add(field, issue);
        }
    }

    pub fn one_of(&mut self, value: &str, allowed: &[&str], field: &str) {
        if !allowed.contains(&value) {
            self.add(field, &format!("Must be one of: {}", allowed.join(", ")));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            return Ok(());
        }

        let message = if self.errors.len() == 1 {
            self.errors[0].message.clone()
        } else {
            format!("{} fields are invalid", self.errors.len())
        };

        Err(AppError::Validation {
            message,
            errors: self.errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_email() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("jean.dupont+rdv@clinique.qc.ca"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("space @b.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_phone() {
        assert!(is_valid_phone("514-555-0199"));
        assert!(is_valid_phone("+1 (514) 555-0199"));
        assert!(is_valid_phone("0612345678"));
        assert!(!is_valid_phone("555-0199"));
        assert!(!is_valid_phone("514-555-01ab"));
        assert!(!is_valid_phone("+1234567890123456"));
    }

    #[test]
    fn test_date() {
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2024-13-01"));
        assert!(!is_valid_date("2023-02-29"));
        assert!(!is_valid_date("2024-1-01"));
        assert!(!is_valid_date("01/02/2024"));
    }

    #[test]
    fn test_time() {
        assert!(is_valid_time("00:00"));
        assert!(is_valid_time("23:59"));
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("9:30"));
        assert!(!is_valid_time("09:60"));
        assert!(!is_valid_time("09:30:00"));
    }

    #[test]
    fn test_duration_bounds() {
        assert!(!is_valid_duration(4));
        assert!(is_valid_duration(5));
        assert!(is_valid_duration(240));
        assert!(!is_valid_duration(241));
        assert!(!is_valid_duration(0));
        assert!(!is_valid_duration(-30));
    }

    #[test]
    fn test_password() {
        assert!(is_valid_password("Secret123"));
        assert!(!is_valid_password("short1A"));
        assert!(!is_valid_password("alllowercase1"));
        assert_eq!(password_issues("password").len(), 2);
    }

    #[test]
    fn test_field_errors_collects_messages() {
        let mut errors = FieldErrors::new();
        errors.email("nope", "email");
        errors.duration(300, "duration_minutes");
        let date = errors.date("2024-13-01", "date");
        assert!(date.is_none());

        assert_matches!(
            errors.into_result(),
            Err(AppError::Validation { errors, .. }) if errors.len() == 3 && errors[0].field == "email"
        );
    }

    #[test]
    fn test_field_errors_ok_when_empty() {
        let mut errors = FieldErrors::new();
        errors.required("Marie", "first_name");
        errors.one_of("fr", &["fr", "en"], "language");
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }
}
