use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::ApiError;

/// A single field-level validation failure, returned inside the `errors`
/// array of a 400 response.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Accumulates field errors across a request body; each DTO composes the
/// rules it needs and calls `finish`.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(
        &mut self,
        field: &'static str,
        ok: bool,
        message: impl Into<String>,
    ) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                field,
                message: message.into(),
            });
        }
        self
    }

    pub fn require(&mut self, field: &'static str, value: &str) -> &mut Self {
        self.check(field, !value.trim().is_empty(), "is required")
    }

    pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self;
        }
        self.check(field, is_valid_email(value), "is not a valid email address")
    }

    pub fn max_len(&mut self, field: &'static str, value: &str, max: usize) -> &mut Self {
        self.check(
            field,
            value.chars().count() <= max,
            format!("must be at most {max} characters"),
        )
    }

    /// At least 8 characters with one uppercase letter, one lowercase letter
    /// and one digit.
    pub fn strong_password(&mut self, field: &'static str, value: &str) -> &mut Self {
        let strong = value.chars().count() >= 8
            && value.chars().any(|c| c.is_ascii_uppercase())
            && value.chars().any(|c| c.is_ascii_lowercase())
            && value.chars().any(|c| c.is_ascii_digit());
        self.check(
            field,
            strong,
            "must be at least 8 characters and contain an uppercase letter, a lowercase letter and a digit",
        )
    }

    pub fn one_of(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        allowed: &[&str],
    ) -> &mut Self {
        match value {
            Some(v) => self.check(
                field,
                allowed.contains(&v),
                format!("must be one of: {}", allowed.join(", ")),
            ),
            None => self,
        }
    }

    pub fn range(
        &mut self,
        field: &'static str,
        value: Option<i32>,
        min: i32,
        max: i32,
    ) -> &mut Self {
        match value {
            Some(v) => self.check(
                field,
                (min..=max).contains(&v),
                format!("must be between {min} and {max}"),
            ),
            None => self,
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn strong_password_rules() {
        let ok = |p: &str| {
            let mut v = Validator::new();
            v.strong_password("password", p);
            v.finish().is_ok()
        };
        assert!(ok("Abc12345!"));
        assert!(ok("Passw0rd"));
        assert!(!ok("short1A"));
        assert!(!ok("alllowercase1"));
        assert!(!ok("ALLUPPERCASE1"));
        assert!(!ok("NoDigitsHere"));
    }

    #[test]
    fn errors_accumulate_per_field() {
        let mut v = Validator::new();
        v.require("email", "").email("email", "");
        v.strong_password("password", "weak");
        let err = v.finish().unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field, "email");
                assert_eq!(errors[1].field, "password");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn one_of_ignores_absent_values() {
        let mut v = Validator::new();
        v.one_of("status", None, &["open", "done"]);
        assert!(v.finish().is_ok());

        let mut v = Validator::new();
        v.one_of("status", Some("bogus"), &["open", "done"]);
        assert!(v.finish().is_err());
    }

    #[test]
    fn range_checks_bounds() {
        let mut v = Validator::new();
        v.range("age", Some(12), 13, 120);
        assert!(v.finish().is_err());

        let mut v = Validator::new();
        v.range("age", Some(42), 13, 120);
        assert!(v.finish().is_ok());
    }
}
