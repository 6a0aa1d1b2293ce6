//! Logging helpers for `Result` and `Option`.
//!
//! Services call `.log("...")` on fallible steps whose failure should leave
//! a trace with the caller's source location, then keep propagating with `?`.

use std::fmt::Display;
use std::panic::Location;

/// Adds `log` to `Result`: records the error with context, returns the result unchanged.
pub trait ResultExt<T, E> {
    fn log<S: ToString>(self, context: S) -> Result<T, E>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log<S: ToString>(self, context: S) -> Result<T, E> {
        if let Err(ref e) = self {
            let at = Location::caller();
            tracing::error!(
                target: "tripdesk_server",
                error = %e,
                file = %format!("{}:{}", at.file(), at.line()),
                context = %context.to_string(),
                "Operation failed"
            );
        }
        self
    }
}

/// Adds `log_none` to `Option`: warns when an expected value is missing.
pub trait OptionResultExt<T> {
    fn log_none<S: ToString>(self, context: S) -> Option<T>;
}

impl<T> OptionResultExt<T> for Option<T> {
    #[track_caller]
    fn log_none<S: ToString>(self, context: S) -> Option<T> {
        if self.is_none() {
            let at = Location::caller();
            tracing::warn!(
                target: "tripdesk_server",
                file = %format!("{}:{}", at.file(), at.line()),
                context = %context.to_string(),
                "Expected value was None"
            );
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_log_passes_ok_through() {
        let result: Result<i64, AppError> = Ok(1250);
        assert_eq!(result.log("pricing activity").unwrap(), 1250);
    }

    #[test]
    fn test_log_keeps_error_variant() {
        let result: Result<(), AppError> = Err(AppError::NotFound("trip 7".to_string()));
        let logged = result.log("loading trip");
        assert!(matches!(logged, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_log_none() {
        assert_eq!(Some("Lisbon").log_none("day location"), Some("Lisbon"));
        assert!(None::<&str>.log_none("day location").is_none());
    }
}
