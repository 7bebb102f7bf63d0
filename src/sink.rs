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

use crate::Append;
use crate::Level;
use crate::Trap;
use crate::level::AtomicLevel;
use crate::record::Record;
use crate::trap::DefaultTrap;

/// A leveled sink: records at or above the minimum level are handed to every appender.
///
/// Errors from appenders never reach the caller; they are passed to the sink's [`Trap`].
///
/// # Examples
///
/// ```
/// use logforth_channels::Level;
/// use logforth_channels::Sink;
/// use logforth_channels::append::Stdout;
/// use logforth_channels::record::Record;
///
/// let sink = Sink::builder(Level::Info).append(Stdout::default()).build();
/// sink.log(&Record::builder().level(Level::Warn).payload("hello").build());
/// ```
#[derive(Debug)]
pub struct Sink {
    level: AtomicLevel,
    appends: Vec<Box<dyn Append>>,
    trap: Box<dyn Trap>,
}

impl Sink {
    /// Create a [`SinkBuilder`] with the given minimum level.
    pub fn builder(level: Level) -> SinkBuilder {
        SinkBuilder {
            level,
            appends: vec![],
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// The current minimum level.
    pub fn level(&self) -> Level {
        self.level.level()
    }

    /// Change the minimum level.
    pub fn set_level(&self, level: Level) {
        self.level.set_level(level);
    }

    /// Whether a record at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        self.level.enabled(level)
    }

    /// Write the record to every appender if its level is enabled.
    pub fn log(&self, record: &Record) {
        if !self.enabled(record.level()) {
            return;
        }

        for append in &self.appends {
            if let Err(err) = append.append(record) {
                self.trap.trap(&err);
            }
        }
    }

    /// Flush every appender.
    pub fn flush(&self) {
        for append in &self.appends {
            if let Err(err) = append.flush() {
                self.trap.trap(&err);
            }
        }
    }
}

/// A builder for [`Sink`].
#[must_use = "call `build` to construct the sink"]
#[derive(Debug)]
pub struct SinkBuilder {
    level: Level,
    appends: Vec<Box<dyn Append>>,
    trap: Box<dyn Trap>,
}

impl SinkBuilder {
    /// Add an appender.
    pub fn append(mut self, append: impl Into<Box<dyn Append>>) -> Self {
        self.appends.push(append.into());
        self
    }

    /// Set the trap for appender errors.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Build the [`Sink`].
    pub fn build(self) -> Sink {
        Sink {
            level: AtomicLevel::new(self.level),
            appends: self.appends,
            trap: self.trap,
        }
    }
}
