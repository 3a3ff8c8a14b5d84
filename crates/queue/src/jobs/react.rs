//! Reaction job.

use engage_core::services::engagement::MAX_REACTION_CHARS;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// The only reaction action; adding, removing and switching are all toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactAction {
    #[default]
    Toggle,
}

/// Toggle one emoji reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ReactJob {
    #[validate(range(min = 1))]
    pub user_id: i64,

    #[validate(range(min = 1))]
    pub note_id: i64,

    #[validate(custom(function = "validate_emoji"))]
    pub emoji: String,

    #[serde(default)]
    pub action: ReactAction,
}

impl ReactJob {
    /// Create a new toggle job.
    #[must_use]
    pub const fn new(user_id: i64, note_id: i64, emoji: String) -> Self {
        Self {
            user_id,
            note_id,
            emoji,
            action: ReactAction::Toggle,
        }
    }
}

fn validate_emoji(emoji: &str) -> Result<(), ValidationError> {
    let length = emoji.chars().count();
    if emoji.trim().is_empty() || length > MAX_REACTION_CHARS {
        return Err(ValidationError::new("emoji"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let job: ReactJob = serde_json::from_str(
            r#"{"user_id": 1, "note_id": 2, "emoji": "🔥", "action": "toggle"}"#,
        )
        .unwrap();
        assert_eq!(job, ReactJob::new(1, 2, "🔥".to_string()));

        assert!(
            serde_json::from_str::<ReactJob>(
                r#"{"user_id": 1, "note_id": 2, "emoji": "🔥", "action": "add"}"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_validation() {
        assert!(ReactJob::new(1, 2, "👍".to_string()).validate().is_ok());
        assert!(ReactJob::new(1, 2, String::new()).validate().is_err());
        assert!(ReactJob::new(1, 2, " ".repeat(3)).validate().is_err());
        assert!(ReactJob::new(0, 2, "👍".to_string()).validate().is_err());
    }
}
