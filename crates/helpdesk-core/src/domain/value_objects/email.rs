//! Email address of a user account.
//!
//! Addresses are stored trimmed and lowercased so lookups by email are exact.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, EmailError> {
        let value = value.as_ref().trim().to_lowercase();
        if value.is_empty() {
            return Err(EmailError::Empty);
        }
        if !is_valid_address(&value) {
            return Err(EmailError::InvalidFormat);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// local@domain.tld with word characters separated by single '.' or '-'
fn is_valid_address(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if domain.contains('@') {
        return false;
    }
    let segments_ok = |part: &str| {
        !part.is_empty() && part.split(['.', '-']).all(|seg| !seg.is_empty() && seg.chars().all(is_word))
    };
    let Some((_, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    segments_ok(local) && segments_ok(domain) && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    Empty,
    InvalidFormat,
}

impl std::error::Error for EmailError {}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "email is required"),
            Self::InvalidFormat => write!(f, "email is not a valid address"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let email = Email::parse("  Ana.Perez@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "ana.perez@example.com");
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at-sign"), Err(EmailError::InvalidFormat));
        assert_eq!(Email::parse("a@b"), Err(EmailError::InvalidFormat));
        assert_eq!(Email::parse("a..b@example.com"), Err(EmailError::InvalidFormat));
        assert_eq!(Email::parse("a@b@example.com"), Err(EmailError::InvalidFormat));
    }

    #[test]
    fn test_accepts_dashed_domain() {
        assert!(Email::parse("support@help-desk.io").is_ok());
    }
}
