//! Prometheus duration notation (`10s`, `1m30s`, `2h`)

use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;
const MILLIS_PER_WEEK: u64 = 7 * MILLIS_PER_DAY;
const MILLIS_PER_YEAR: u64 = 365 * MILLIS_PER_DAY;

/// A duration rendered in Prometheus notation, millisecond precision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PromDuration(pub Duration);

impl PromDuration {
    /// Parse Prometheus notation such as `1h30m` or `500ms`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if s == "0" {
            return Some(Self(Duration::ZERO));
        }

        let bytes = s.as_bytes();
        let mut total: u64 = 0;
        let mut i = 0;
        while i < bytes.len() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if start == i {
                return None;
            }
            let value: u64 = s[start..i].parse().ok()?;

            let unit = if s[i..].starts_with("ms") {
                i += 2;
                1
            } else {
                let unit = match bytes.get(i)? {
                    b'y' => MILLIS_PER_YEAR,
                    b'w' => MILLIS_PER_WEEK,
                    b'd' => MILLIS_PER_DAY,
                    b'h' => MILLIS_PER_HOUR,
                    b'm' => MILLIS_PER_MINUTE,
                    b's' => MILLIS_PER_SECOND,
                    _ => return None,
                };
                i += 1;
                unit
            };

            total = total.checked_add(value.checked_mul(unit)?)?;
        }

        Some(Self(Duration::from_millis(total)))
    }
}

impl fmt::Display for PromDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut millis = self.0.as_millis() as u64;
        if millis == 0 {
            return f.write_str("0s");
        }

        for (unit, suffix) in [
            (MILLIS_PER_HOUR, "h"),
            (MILLIS_PER_MINUTE, "m"),
            (MILLIS_PER_SECOND, "s"),
            (1, "ms"),
        ] {
            let count = millis / unit;
            if count > 0 {
                write!(f, "{count}{suffix}")?;
                millis %= unit;
            }
        }
        Ok(())
    }
}

impl Serialize for PromDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PromDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PromDurationVisitor;

        impl Visitor<'_> for PromDurationVisitor {
            type Value = PromDuration;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a Prometheus duration such as 10s or 1m30s")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                PromDuration::parse(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(PromDurationVisitor)
    }
}
