//! Request validation shared by album and track services.
//!
//! # Responsibility
//! - Check service requests before any repository call.
//! - Report every failing field at once, not just the first.
//!
//! # Invariants
//! - Validators are pure: they never touch storage or the clock; callers
//!   pass `today`.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use uuid::Uuid;

use crate::model::track::parse_duration;

pub const MAX_TITLE_CHARS: usize = 50;
pub const MAX_ARTIST_CHARS: usize = 50;

static ISRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{3}[0-9]{7}$").expect("valid isrc regex"));

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Dotted field path, e.g. `tracks[1].isrc`.
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accumulates issues for one request.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    pub(crate) fn required_text(&mut self, field: &str, value: &str, max_chars: usize) {
        if value.trim().is_empty() {
            self.issues
                .push(ValidationIssue::new(field, "must not be empty"));
        } else if value.chars().count() > max_chars {
            self.issues.push(ValidationIssue::new(
                field,
                format!("must be at most {max_chars} characters"),
            ));
        }
    }

    pub(crate) fn release_date(&mut self, field: &str, value: NaiveDate, today: NaiveDate) {
        if value > today {
            self.issues
                .push(ValidationIssue::new(field, "must not be in the future"));
        }
    }

    /// Returns the parsed duration when `value` is valid.
    pub(crate) fn duration(&mut self, field: &str, value: &str) -> Option<Duration> {
        match parse_duration(value) {
            Some(duration) if !duration.is_zero() => Some(duration),
            Some(_) => {
                self.issues
                    .push(ValidationIssue::new(field, "must be greater than zero"));
                None
            }
            None => {
                self.issues
                    .push(ValidationIssue::new(field, "must be formatted as hh:mm:ss"));
                None
            }
        }
    }

    pub(crate) fn isrc(&mut self, field: &str, value: &str) {
        if !ISRC_RE.is_match(value) {
            self.issues.push(ValidationIssue::new(
                field,
                "must match the ISRC format CCXXXYYNNNNN",
            ));
        }
    }

    pub(crate) fn album_id(&mut self, field: &str, value: &Uuid) {
        if value.is_nil() {
            self.issues
                .push(ValidationIssue::new(field, "must not be empty"));
        }
    }

    pub(crate) fn non_empty<T>(&mut self, field: &str, items: &[T]) {
        if items.is_empty() {
            self.issues
                .push(ValidationIssue::new(field, "must contain at least one item"));
        }
    }

    pub(crate) fn finish(self) -> Result<(), Vec<ValidationIssue>> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(self.issues)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Validator;
    use chrono::NaiveDate;
    use std::time::Duration;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn text_rules_cover_blank_and_overlong() {
        let mut validator = Validator::default();
        validator.required_text("title", "   ", 50);
        validator.required_text("artist", &"x".repeat(51), 50);
        validator.required_text("ok", &"é".repeat(50), 50);

        let issues = validator.finish().expect_err("two fields should fail");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field, "title");
        assert!(issues[1].message.contains("50"));
    }

    #[test]
    fn release_date_allows_today_but_not_tomorrow() {
        let today = date(2024, 5, 10);
        let mut validator = Validator::default();
        validator.release_date("release_date", today, today);
        assert!(validator.finish().is_ok());

        let mut validator = Validator::default();
        validator.release_date("release_date", date(2024, 5, 11), today);
        assert!(validator.finish().is_err());
    }

    #[test]
    fn duration_must_parse_and_be_positive() {
        let mut validator = Validator::default();
        assert_eq!(
            validator.duration("duration", "00:03:15"),
            Some(Duration::from_secs(195))
        );
        assert_eq!(validator.duration("duration", "00:00:00"), None);
        assert_eq!(validator.duration("duration", "three minutes"), None);

        let issues = validator.finish().expect_err("two durations should fail");
        assert!(issues[0].message.contains("greater than zero"));
        assert!(issues[1].message.contains("hh:mm:ss"));
    }

    #[test]
    fn isrc_follows_country_registrant_year_designation_layout() {
        let mut validator = Validator::default();
        validator.isrc("isrc", "USRC17607839");
        validator.isrc("isrc", "GBAYE0601498");
        assert!(validator.finish().is_ok());

        for bad in ["usrc17607839", "US-RC1-76-07839", "USRC1760783", "USRC1760783X"] {
            let mut validator = Validator::default();
            validator.isrc("isrc", bad);
            assert!(validator.finish().is_err(), "`{bad}` should be rejected");
        }
    }

    #[test]
    fn nil_album_id_and_empty_list_are_rejected() {
        let mut validator = Validator::default();
        validator.album_id("album_id", &Uuid::nil());
        validator.non_empty::<u8>("tracks", &[]);
        assert_eq!(validator.finish().expect_err("should fail").len(), 2);
    }
}
