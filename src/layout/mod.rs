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

//! Layouts for formatting log records.

use std::fmt;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::Error;
use crate::record::Record;

mod console;
mod json;

pub use self::console::ConsoleLayout;
pub use self::json::JsonLayout;

/// A layout for formatting log records.
pub trait Layout: fmt::Debug + Send + Sync + 'static {
    /// Formats a log record into one line, without the trailing line ending.
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error>;
}

impl<T: Layout> From<T> for Box<dyn Layout> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

// millisecond precision, e.g. 2024-08-10T17:12:52.125
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%3f";

fn format_time(record: &Record, tz: Option<&TimeZone>) -> Result<String, Error> {
    let ts = Timestamp::try_from(record.time())
        .map_err(|err| Error::new("record time is out of range").with_source(err))?;
    let tz = tz.cloned().unwrap_or_else(TimeZone::system);
    Ok(ts.to_zoned(tz).strftime(TIME_FORMAT).to_string())
}

fn format_caller(record: &Record) -> Option<String> {
    let file = record.file()?;
    let line = record.line().unwrap_or_default();
    Some(format!("{file}:{line}"))
}
