//! Contract failure type
//!
//! Every way a call can abort (failed assertion, bad input, missing
//! authorization, insufficient balance, failed nested call) is reported to the
//! caller as a [`Failure`]: a reason string plus an optional numeric code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of any primitive or contract method
pub type ExecResult<T> = Result<T, Failure>;

/// A structured abort raised by `fail`/`assert` or by a host primitive
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{reason}{}", code_suffix(.code))]
pub struct Failure {
    /// Human-readable reason
    pub reason: String,
    /// Protocol-specific code, stable per contract
    pub code: Option<u32>,
}

fn code_suffix(code: &Option<u32>) -> String {
    match code {
        Some(code) => format!(" (code {})", code),
        None => String::new(),
    }
}

impl Failure {
    /// Failure without a code
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            code: None,
        }
    }

    /// Failure with a protocol code
    pub fn with_code(reason: impl Into<String>, code: u32) -> Self {
        Self {
            reason: reason.into(),
            code: Some(code),
        }
    }
}

/// Abort the current call
pub fn fail<T>(reason: impl Into<String>, code: impl Into<Option<u32>>) -> ExecResult<T> {
    Err(Failure {
        reason: reason.into(),
        code: code.into(),
    })
}

/// Abort the current call unless `cond` holds
pub fn ensure(cond: bool, reason: impl Into<String>, code: impl Into<Option<u32>>) -> ExecResult<()> {
    if cond {
        Ok(())
    } else {
        fail(reason, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_code() {
        let failure = Failure::with_code("still locked", 2);
        assert_eq!(failure.to_string(), "still locked (code 2)");
        assert_eq!(Failure::new("boom").to_string(), "boom");
    }

    #[test]
    fn test_ensure() {
        assert!(ensure(true, "unreachable", None).is_ok());

        let err = ensure(false, "user != owner", 1).unwrap_err();
        assert_eq!(err.reason, "user != owner");
        assert_eq!(err.code, Some(1));
    }

    #[test]
    fn test_fail_without_code() {
        let err: ExecResult<()> = fail("nope", None);
        assert_eq!(err.unwrap_err().code, None);
    }
}
