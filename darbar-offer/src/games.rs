use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A promotional mini-game shown in the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniGame {
    #[serde(default)]
    pub name: String,
    /// Prize or offer attached to the game; numbers and strings are both used.
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl MiniGame {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.name.trim().is_empty() || is_blank(&self.value) {
            return Err(GameError::MissingFields);
        }
        Ok(())
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GameError {
    #[error("Name and offer are required")]
    MissingFields,

    #[error("Collection limit reached")]
    LimitReached { max: usize },
}

/// Upper bound on how many mini-games may exist at once.
#[derive(Debug, Clone, Copy)]
pub struct GameLimit {
    max: usize,
}

impl GameLimit {
    pub fn new(max: usize) -> Self {
        Self { max }
    }

    pub fn check(&self, existing: usize) -> Result<(), GameError> {
        if existing >= self.max {
            return Err(GameError::LimitReached { max: self.max });
        }
        Ok(())
    }
}
