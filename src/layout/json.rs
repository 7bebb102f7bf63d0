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

use jiff::tz::TimeZone;
use serde::Serialize;

use crate::Error;
use crate::layout::Layout;
use crate::layout::format_caller;
use crate::layout::format_time;
use crate::record::Record;

/// A layout that formats log record as JSON lines.
///
/// Output format:
///
/// ```json
/// {"time":"2024-08-11T22:44:57.172","level":"error","linenum":"src/main.rs:12","msg":"Hello error!"}
/// {"time":"2024-08-11T22:44:57.172","level":"info","logger":"billing","msg":"Hello info!"}
/// ```
///
/// The `logger` key is written only for named loggers, `linenum` only when caller annotation is
/// enabled, and `stacktrace` only when a backtrace was captured.
///
/// `linenum` holds the file as the compiler reports it for the call site, which is relative to
/// the package root of the calling crate (`src/main.rs:12`), not an absolute path.
///
/// # Examples
///
/// ```
/// use logforth_channels::layout::JsonLayout;
///
/// let json_layout = JsonLayout::default();
/// ```
#[derive(Default, Debug, Clone)]
pub struct JsonLayout {
    tz: Option<TimeZone>,
}

impl JsonLayout {
    /// Sets the timezone for timestamps.
    ///
    /// Default to the system timezone.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use logforth_channels::layout::JsonLayout;
    ///
    /// let json_layout = JsonLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
struct RecordLine<'a> {
    time: String,
    level: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    logger: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    linenum: Option<String>,
    msg: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stacktrace: Option<&'a str>,
}

impl Layout for JsonLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let record_line = RecordLine {
            time: format_time(record, self.tz.as_ref())?,
            level: record.level().as_str(),
            logger: record.logger(),
            linenum: format_caller(record),
            msg: record.payload(),
            stacktrace: record.stacktrace(),
        };

        serde_json::to_vec(&record_line)
            .map_err(|err| Error::new("failed to serialize record").with_source(err))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use std::time::SystemTime;

    use super::*;
    use crate::Level;

    fn at_epoch_plus(millis: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_millis(millis)
    }

    #[test]
    fn test_json_line_with_caller() {
        let layout = JsonLayout::default().timezone(TimeZone::UTC);
        let record = Record::builder()
            .time(at_epoch_plus(1_723_309_972_125))
            .level(Level::Warn)
            .file(Some("src/server.rs"))
            .line(Some(42))
            .payload("disk almost full")
            .build();

        let line = String::from_utf8(layout.format(&record).unwrap()).unwrap();
        assert_eq!(
            line,
            r#"{"time":"2024-08-10T17:12:52.125","level":"warn","linenum":"src/server.rs:42","msg":"disk almost full"}"#
        );
    }

    #[test]
    fn test_json_line_omits_optional_keys() {
        let layout = JsonLayout::default().timezone(TimeZone::UTC);
        let record = Record::builder()
            .time(at_epoch_plus(0))
            .level(Level::Info)
            .logger(Some("billing"))
            .payload("a \"quoted\" word")
            .build();

        let line = String::from_utf8(layout.format(&record).unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["time"], "1970-01-01T00:00:00.000");
        assert_eq!(value["logger"], "billing");
        assert_eq!(value["msg"], "a \"quoted\" word");
        assert!(value.get("linenum").is_none());
        assert!(value.get("stacktrace").is_none());
    }
}
