// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

use crate::Error;
use crate::ErrorKind;

/// The severity of a log record.
///
/// Levels are ordered from the most verbose to the most severe, so `Level::Debug < Level::Error`.
/// [`Level::Panic`] and [`Level::Fatal`] are terminal: records at these levels are written before
/// the caller aborts.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Designates very low priority, often extremely verbose, information.
    Trace = 0,
    /// Designates lower priority information.
    Debug = 1,
    /// Designates useful information.
    Info = 2,
    /// Designates hazardous situations.
    Warn = 3,
    /// Designates very serious errors.
    Error = 4,
    /// Designates errors after which the current thread panics.
    Panic = 5,
    /// Designates errors after which the process exits.
    Fatal = 6,
}

impl Level {
    const ALL: [Level; 7] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Panic,
        Level::Fatal,
    ];

    /// Return the lowercase name of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Panic => "panic",
            Level::Fatal => "fatal",
        }
    }

    fn from_u8(n: u8) -> Level {
        Level::ALL
            .get(n as usize)
            .copied()
            .unwrap_or(Level::Fatal)
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        // an unset level means info
        if s.is_empty() {
            return Ok(Level::Info);
        }

        for (name, level) in [
            ("trace", Level::Trace),
            ("debug", Level::Debug),
            ("info", Level::Info),
            ("warn", Level::Warn),
            ("warning", Level::Warn),
            ("error", Level::Error),
            ("panic", Level::Panic),
            ("fatal", Level::Fatal),
        ] {
            if s.eq_ignore_ascii_case(name) {
                return Ok(level);
            }
        }

        Err(Error::with_kind(
            ErrorKind::InvalidLevel,
            format!("malformed level: {s:?}"),
        ))
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

/// A minimum level that can be changed while records are being written.
#[derive(Debug)]
pub struct AtomicLevel(AtomicU8);

impl AtomicLevel {
    /// Create a new `AtomicLevel` starting at `level`.
    pub fn new(level: Level) -> Self {
        Self(AtomicU8::new(level as u8))
    }

    /// The current minimum level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.0.load(Ordering::Relaxed))
    }

    /// Replace the minimum level.
    pub fn set_level(&self, level: Level) {
        self.0.store(level as u8, Ordering::Relaxed);
    }

    /// Whether a record at `level` passes this minimum.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        for level in Level::ALL {
            let upper = level.as_str().to_ascii_uppercase();
            assert_eq!(Level::from_str(level.as_str()).unwrap(), level);
            assert_eq!(Level::from_str(&upper).unwrap(), level);
        }
        assert_eq!(Level::from_str("Warning").unwrap(), Level::Warn);
        assert_eq!(Level::from_str("").unwrap(), Level::Info);
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        let err = Level::from_str("bogus").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLevel);
        assert!(Level::from_str("crit").is_err());
    }

    #[test]
    fn test_atomic_level() {
        let level = AtomicLevel::new(Level::Info);
        assert!(!level.enabled(Level::Debug));
        assert!(level.enabled(Level::Info));
        assert!(level.enabled(Level::Panic));

        level.set_level(Level::Error);
        assert_eq!(level.level(), Level::Error);
        assert!(!level.enabled(Level::Warn));
    }
}
