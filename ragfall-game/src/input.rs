//! Directional input symbols fed to the combo recognizer.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Map a raw key identifier (browser `KeyboardEvent.key` style) to a symbol.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Self::Up),
            "ArrowDown" | "s" | "S" => Some(Self::Down),
            "ArrowLeft" | "a" | "A" => Some(Self::Left),
            "ArrowRight" | "d" | "D" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(()),
        }
    }
}

/// A single timestamped directional key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub symbol: Direction,
    pub timestamp_ms: u64,
}

impl InputEvent {
    #[must_use]
    pub const fn new(symbol: Direction, timestamp_ms: u64) -> Self {
        Self {
            symbol,
            timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_keys() {
        for dir in Direction::ALL {
            assert_eq!(dir.as_str().parse::<Direction>(), Ok(dir));
        }
        assert_eq!(Direction::from_key("ArrowLeft"), Some(Direction::Left));
        assert_eq!(Direction::from_key("D"), Some(Direction::Right));
        assert_eq!(Direction::from_key("Space"), None);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&[Direction::Up, Direction::Right]).unwrap();
        assert_eq!(json, r#"["up","right"]"#);
    }
}
