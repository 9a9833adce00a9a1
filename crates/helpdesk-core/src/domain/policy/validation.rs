//! Field constraints shared by the policy and account registration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use super::PolicyError;
use crate::domain::value_objects::{TicketPriority, TicketStatus};

pub const TITLE_LEN: RangeInclusive<usize> = 3..=200;
pub const DESCRIPTION_LEN: RangeInclusive<usize> = 10..=2000;
pub const MESSAGE_LEN: RangeInclusive<usize> = 1..=2000;
pub const NAME_LEN: RangeInclusive<usize> = 2..=100;
pub const PASSWORD_MIN_LEN: usize = 6;

/// One violated constraint, keyed by the wire name of the field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Trimmed value, or `None` when absent or blank
pub fn supplied(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Collects every violation before failing
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.0.push(FieldViolation { field: field.to_string(), reason: reason.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn finish(self) -> Result<(), PolicyError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(PolicyError::ValidationFailed(self.0))
        }
    }

    fn check_len(&mut self, field: &str, value: &str, bounds: &RangeInclusive<usize>) {
        let len = value.chars().count();
        if len < *bounds.start() {
            self.push(field, format!("must be at least {} characters", bounds.start()));
        } else if len > *bounds.end() {
            self.push(field, format!("must be at most {} characters", bounds.end()));
        }
    }

    /// Required trimmed text. Returns the trimmed value; an empty string
    /// comes back only alongside a recorded violation.
    pub fn required_text(&mut self, field: &str, raw: Option<&str>, bounds: RangeInclusive<usize>) -> String {
        match supplied(raw) {
            Some(value) => {
                self.check_len(field, value, &bounds);
                value.to_string()
            }
            None => {
                self.push(field, "is required");
                String::new()
            }
        }
    }

    /// Optional trimmed text; blank input counts as not supplied
    pub fn optional_text(&mut self, field: &str, raw: Option<&str>, bounds: RangeInclusive<usize>) -> Option<String> {
        let value = supplied(raw)?;
        self.check_len(field, value, &bounds);
        Some(value.to_string())
    }

    /// Comment bodies keep their whitespace but may not be blank
    pub fn message(&mut self, raw: Option<&str>) -> String {
        match raw {
            Some(value) if !value.trim().is_empty() => {
                self.check_len("message", value, &MESSAGE_LEN);
                value.to_string()
            }
            _ => {
                self.push("message", "is required");
                String::new()
            }
        }
    }

    pub fn status(&mut self, raw: Option<&str>) -> Option<TicketStatus> {
        let value = supplied(raw)?;
        match value.parse() {
            Ok(status) => Some(status),
            Err(_) => {
                self.push("status", one_of(TicketStatus::ALL.iter().map(|s| s.as_str())));
                None
            }
        }
    }

    pub fn priority(&mut self, raw: Option<&str>) -> Option<TicketPriority> {
        let value = supplied(raw)?;
        match value.parse() {
            Ok(priority) => Some(priority),
            Err(_) => {
                self.push("priority", one_of(TicketPriority::ALL.iter().map(|p| p.as_str())));
                None
            }
        }
    }
}

fn one_of<'a>(allowed: impl Iterator<Item = &'a str>) -> String {
    format!("must be one of {}", allowed.collect::<Vec<_>>().join(", "))
}
