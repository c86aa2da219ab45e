//! Tagged result of a fallible external operation.
//!
//! Annotation calls go to services that fail routinely in partially
//! configured environments. Instead of swallowing those failures, callers
//! wrap them in an [`Outcome`] and decide per call site whether the failure
//! becomes an error marker (kept in the output) or triggers a fallback.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Either the value produced by an external call or the reason it failed.
///
/// Serializes as the bare value on success and as `{"error": "..."}` on
/// failure, which is the shape written into result files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Failed { error: String },
    Done(T),
}

impl<T> Outcome<T> {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            error: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            Self::Done(_) => None,
        }
    }
}

impl<T, E: Display> From<std::result::Result<T, E>> for Outcome<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(v) => Self::Done(v),
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_failure_serializes_as_error_marker() {
        let outcome: Outcome<Vec<String>> =
            Err::<Vec<String>, _>(Error::Annotation("quota exceeded".into())).into();
        assert!(outcome.is_failed());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Annotation error: quota exceeded"})
        );
    }

    #[test]
    fn test_success_serializes_as_value() {
        let outcome: Outcome<Vec<String>> = Ok::<_, Error>(vec!["Paris".to_string()]).into();
        assert!(!outcome.is_failed());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!(["Paris"]));
    }

    #[test]
    fn test_roundtrip_failed_marker() {
        let parsed: Outcome<Vec<String>> =
            serde_json::from_str(r#"{"error":"no key"}"#).unwrap();
        assert_eq!(parsed.error(), Some("no key"));
    }
}
