//! Runtime values rendered as `"<n> mins"` on the wire.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// A small positive duration in minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Runtime(pub i32);

/// Raised when a runtime string is not of the form `"<n> mins"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid runtime format")]
pub struct RuntimeFormatError;

impl Runtime {
    pub fn minutes(self) -> i32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = RuntimeFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(' ');
        let (Some(number), Some("mins"), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(RuntimeFormatError);
        };

        number.parse::<i32>().map(Runtime).map_err(|_| RuntimeFormatError)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct RuntimeVisitor;

impl Visitor<'_> for RuntimeVisitor {
    type Value = Runtime;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string of the form \"<n> mins\"")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Runtime, E> {
        value.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(RuntimeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_minutes_suffix() {
        let json = serde_json::to_string(&Runtime(102)).unwrap();
        assert_eq!(json, "\"102 mins\"");
    }

    #[test]
    fn test_parses_minutes_suffix() {
        let runtime: Runtime = serde_json::from_str("\"95 mins\"").unwrap();
        assert_eq!(runtime.minutes(), 95);
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(serde_json::from_str::<Runtime>("95").is_err());
        assert!(serde_json::from_str::<Runtime>("\"95\"").is_err());
        assert!(serde_json::from_str::<Runtime>("\"95 minutes\"").is_err());
        assert!(serde_json::from_str::<Runtime>("\"ninety mins\"").is_err());
        assert!(serde_json::from_str::<Runtime>("\"95 mins extra\"").is_err());
    }
}
