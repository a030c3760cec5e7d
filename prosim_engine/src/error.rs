//! Engine error taxonomy.
//!
//! Validation and configuration problems are caller mistakes and are
//! reported before any state changes. Consistency violations are engine
//! defects; the week that produced one is discarded.

/// Every way a simulation call can fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("invalid decisions: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("consistency violation [{check}]: {detail}")]
    Consistency { check: &'static str, detail: String },

    #[error("game over: all {max_weeks} weeks have been played")]
    GameOver { max_weeks: u32 },
}

impl SimError {
    pub fn validation(message: impl Into<String>) -> Self {
        SimError::Validation(vec![message.into()])
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        SimError::Configuration(message.into())
    }

    pub fn consistency(check: &'static str, detail: impl Into<String>) -> Self {
        SimError::Consistency {
            check,
            detail: detail.into(),
        }
    }

    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, SimError::Consistency { .. })
    }
}

pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_joined() {
        let err = SimError::Validation(vec!["week mismatch".into(), "bad hours".into()]);
        assert_eq!(err.to_string(), "invalid decisions: week mismatch; bad hours");
    }

    #[test]
    fn consistency_message_names_the_check() {
        let err = SimError::consistency("conservation", "raw materials off by 3.0");
        assert!(err.is_consistency_violation());
        assert_eq!(
            err.to_string(),
            "consistency violation [conservation]: raw materials off by 3.0"
        );
    }
}
