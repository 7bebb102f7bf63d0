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

use std::fmt::Write;

use jiff::tz::TimeZone;

use crate::Error;
use crate::layout::Layout;
use crate::layout::format_caller;
use crate::layout::format_time;
use crate::record::Record;

/// A layout that formats log record as tab-separated plain text.
///
/// Output format:
///
/// ```text
/// 2024-08-11T22:44:57.172	error	src/main.rs:12	Hello error!
/// 2024-08-11T22:44:57.172	info	billing	Hello info!
/// ```
#[derive(Default, Debug, Clone)]
pub struct ConsoleLayout {
    tz: Option<TimeZone>,
}

impl ConsoleLayout {
    /// Sets the timezone for timestamps.
    ///
    /// Default to the system timezone.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

impl Layout for ConsoleLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let mut text = format_time(record, self.tz.as_ref())?;

        // SAFETY: write to a string always succeeds
        write!(&mut text, "\t{}", record.level()).unwrap();
        if let Some(logger) = record.logger() {
            write!(&mut text, "\t{logger}").unwrap();
        }
        if let Some(caller) = format_caller(record) {
            write!(&mut text, "\t{caller}").unwrap();
        }
        write!(&mut text, "\t{}", record.payload()).unwrap();
        if let Some(stacktrace) = record.stacktrace() {
            write!(&mut text, "\n{stacktrace}").unwrap();
        }

        Ok(text.into_bytes())
    }
}
