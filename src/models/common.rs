//! Types shared by every REST endpoint.

use std::fmt;

use serde::Serialize;

use crate::error::{codes, RtirError};

/// The status line that opens every RT REST response, e.g. `RT/4.2.9 200 Ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RtStatus {
    /// Server version string (`RT/4.2.9`).
    pub version: String,
    /// Numeric status code.
    pub code: u16,
    /// Status message (`Ok`, `Credentials required`, ...).
    pub message: String,
}

impl RtStatus {
    /// Parses a status line. Returns `None` for anything that does not
    /// start with `RT/` followed by a numeric code.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim().splitn(3, ' ');
        let version = parts.next()?;
        if !version.starts_with("RT/") {
            return None;
        }
        let code = parts.next()?.trim().parse::<u16>().ok()?;
        let message = parts.next().unwrap_or("").trim().to_string();

        Some(Self {
            version: version.to_string(),
            code,
            message,
        })
    }

    /// Returns true for `200`.
    pub fn is_ok(&self) -> bool {
        self.code == codes::OK
    }

    /// Converts a non-200 status into an error.
    pub fn into_result(self) -> Result<(), RtirError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(RtirError::rt_api(self.code, self.message))
        }
    }
}

impl fmt::Display for RtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.version, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok_line() {
        let status = RtStatus::parse("RT/4.2.9 200 Ok").unwrap();
        assert_eq!(status.version, "RT/4.2.9");
        assert_eq!(status.code, 200);
        assert_eq!(status.message, "Ok");
        assert!(status.is_ok());
    }

    #[test]
    fn test_parse_multi_word_message() {
        let status = RtStatus::parse("RT/4.4.1 401 Credentials required").unwrap();
        assert_eq!(status.code, 401);
        assert_eq!(status.message, "Credentials required");
        assert!(status.into_result().is_err());
    }

    #[test]
    fn test_parse_rejects_other_text() {
        assert!(RtStatus::parse("<html>").is_none());
        assert!(RtStatus::parse("RT/4.2.9 abc Ok").is_none());
        assert!(RtStatus::parse("").is_none());
    }

    #[test]
    fn test_display() {
        let status = RtStatus::parse("RT/4.2.9 200 Ok").unwrap();
        assert_eq!(status.to_string(), "RT/4.2.9 200 Ok");
    }
}
