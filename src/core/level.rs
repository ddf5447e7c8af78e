use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Position of the lift as last reported or requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    One,
    Two,
    Moving,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LevelError {
    #[error("unrecognized level value: {0:?}")]
    Unrecognized(String),

    #[error("level is not a number: {0:?}")]
    NotANumber(String),

    #[error("level {0} is not selectable")]
    OutOfRange(String),
}

impl Level {
    /// Parses a value reported by the lift controller: exactly `"1"`, `"2"` or
    /// `"Moving"`.
    pub fn from_report(value: &str) -> Result<Self, LevelError> {
        match value {
            "1" => Ok(Level::One),
            "2" => Ok(Level::Two),
            "Moving" => Ok(Level::Moving),
            other => Err(LevelError::Unrecognized(other.to_string())),
        }
    }

    /// Parses a floor requested by a user. Only whole floors can be requested,
    /// never `Moving`.
    pub fn from_request(value: &str) -> Result<Self, LevelError> {
        let trimmed = value.trim();
        if !is_integer(trimmed) {
            return Err(LevelError::NotANumber(value.to_string()));
        }
        // Integers too wide for i64 are still integers, just not floors.
        match trimmed.parse::<i64>() {
            Ok(1) => Ok(Level::One),
            Ok(2) => Ok(Level::Two),
            _ => Err(LevelError::OutOfRange(trimmed.to_string())),
        }
    }

    pub fn floor(&self) -> Option<u8> {
        match self {
            Level::One => Some(1),
            Level::Two => Some(2),
            Level::Moving => None,
        }
    }
}

/// Optional sign followed by at least one ASCII digit.
fn is_integer(value: &str) -> bool {
    let digits = value
        .strip_prefix('+')
        .or_else(|| value.strip_prefix('-'))
        .unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.floor() {
            Some(n) => write!(f, "{}", n),
            None => f.write_str("Moving"),
        }
    }
}

/// Floors serialize as numbers, `Moving` as the string `"Moving"`.
impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.floor() {
            Some(n) => serializer.serialize_u8(n),
            None => serializer.serialize_str("Moving"),
        }
    }
}

/// Process-wide lift level. Writers from the web UI and the controller race;
/// the last write wins.
#[derive(Debug)]
pub struct LevelState {
    current: RwLock<Level>,
}

impl Default for LevelState {
    fn default() -> Self {
        Self::new(Level::One)
    }
}

impl LevelState {
    pub fn new(initial: Level) -> Self {
        Self { current: RwLock::new(initial) }
    }

    pub fn get(&self) -> Level {
        *self.current.read()
    }

    /// Unauthenticated update from the lift controller.
    pub fn public_update(&self, value: &str) -> Result<Level, LevelError> {
        let level = Level::from_report(value)?;
        self.set(level);
        tracing::info!("Level updated to: {} (controller)", level);
        Ok(level)
    }

    /// Update requested by an authenticated user. Session checks happen at
    /// the caller.
    pub fn authenticated_change(&self, value: &str) -> Result<Level, LevelError> {
        let level = Level::from_request(value)?;
        self.set(level);
        tracing::info!("Level changed to: {} (user request)", level);
        Ok(level)
    }

    fn set(&self, level: Level) {
        *self.current.write() = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accepts_exactly_three_values() {
        assert_eq!(Level::from_report("1"), Ok(Level::One));
        assert_eq!(Level::from_report("2"), Ok(Level::Two));
        assert_eq!(Level::from_report("Moving"), Ok(Level::Moving));
        for bad in ["3", "two", "moving", " 1", "", "0", "1.0"] {
            assert!(Level::from_report(bad).is_err(), "{:?} accepted", bad);
        }
    }

    #[test]
    fn request_accepts_integers_one_and_two() {
        assert_eq!(Level::from_request("1"), Ok(Level::One));
        assert_eq!(Level::from_request(" 2 "), Ok(Level::Two));
        assert_eq!(Level::from_request("+2"), Ok(Level::Two));
        assert_eq!(Level::from_request("3"), Err(LevelError::OutOfRange("3".into())));
        assert_eq!(Level::from_request("-1"), Err(LevelError::OutOfRange("-1".into())));
        assert_eq!(
            Level::from_request("99999999999999999999"),
            Err(LevelError::OutOfRange("99999999999999999999".into()))
        );
        assert_eq!(
            Level::from_request("-99999999999999999999"),
            Err(LevelError::OutOfRange("-99999999999999999999".into()))
        );
        assert!(matches!(Level::from_request("Moving"), Err(LevelError::NotANumber(_))));
        assert!(matches!(Level::from_request("1.5"), Err(LevelError::NotANumber(_))));
        assert!(matches!(Level::from_request(""), Err(LevelError::NotANumber(_))));
        assert!(matches!(Level::from_request("+"), Err(LevelError::NotANumber(_))));
        assert!(matches!(Level::from_request("+-1"), Err(LevelError::NotANumber(_))));
    }

    #[test]
    fn serializes_floors_as_numbers() {
        assert_eq!(serde_json::to_value(Level::One).unwrap(), serde_json::json!(1));
        assert_eq!(serde_json::to_value(Level::Two).unwrap(), serde_json::json!(2));
        assert_eq!(serde_json::to_value(Level::Moving).unwrap(), serde_json::json!("Moving"));
    }

    #[test]
    fn state_starts_at_one_and_tracks_updates_in_order() {
        let state = LevelState::default();
        assert_eq!(state.get(), Level::One);

        state.authenticated_change("2").unwrap();
        assert_eq!(state.get(), Level::Two);
        state.public_update("Moving").unwrap();
        assert_eq!(state.get(), Level::Moving);
        state.authenticated_change("1").unwrap();
        assert_eq!(state.get(), Level::One);
    }

    #[test]
    fn rejected_updates_leave_state_alone() {
        let state = LevelState::new(Level::Two);
        assert!(state.public_update("3").is_err());
        assert!(state.authenticated_change("7").is_err());
        assert_eq!(state.get(), Level::Two);
    }

    #[test]
    fn concurrent_writers_never_tear() {
        let state = std::sync::Arc::new(LevelState::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = state.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let value = if i % 2 == 0 { "1" } else { "Moving" };
                        state.public_update(value).unwrap();
                        let _ = state.get();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(matches!(state.get(), Level::One | Level::Moving));
    }
}
