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

//! Configuration of the logging channels.
//!
//! A [`Config`] can be written as a struct literal, started from [`Config::default`] and adjusted
//! with option functions, or decoded from an application's configuration file:
//!
//! ```
//! use logforth_channels::config;
//! use logforth_channels::config::Config;
//!
//! let config = Config::with_options([
//!     config::with_level("debug"),
//!     config::with_service_name("billing"),
//!     config::with_stdout(false),
//! ]);
//! assert_eq!(config.level, "debug");
//! assert_eq!(config.log_path.to_str(), Some("logs"));
//! ```
//!
//! No option is validated here. The level name is checked when the configuration is used to
//! build a [`LogContext`](crate::LogContext).

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// The directory used when `log_path` is empty.
pub const DEFAULT_LOG_PATH: &str = "logs";

/// How records are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// One JSON object per line.
    #[default]
    Json,
    /// Tab-separated plain text.
    Console,
}

/// Options of the logging channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum level name: trace, debug, info, warn, error, panic or fatal.
    pub level: String,
    /// Directory of the default info log file.
    pub log_path: PathBuf,
    /// Size in megabytes after which a log file is rotated. Zero means 100.
    pub max_log_size: u64,
    /// Names the default info log file `<log_path>/<service_name>.log`.
    pub service_name: String,
    /// Explicit path of the info log file.
    #[serde(rename = "info_log_file")]
    pub info_output: Option<PathBuf>,
    /// Explicit path of the error log file. Errors go to the info file when unset.
    #[serde(rename = "error_log_file")]
    pub error_output: Option<PathBuf>,
    /// Explicit path of the debug log file. Debug records go to the info file when unset.
    #[serde(rename = "debug_log_file")]
    pub debug_output: Option<PathBuf>,
    /// Do not annotate records with the caller's file and line.
    #[serde(rename = "not_display_file_linenum")]
    pub not_display_line: bool,
    /// Mirror every record to stdout.
    pub stdout: bool,
    /// Rotated files to keep. Zero keeps all of them.
    pub max_backup: u32,
    /// Days to keep rotated files. Zero keeps them regardless of age.
    pub max_age: u32,
    /// Compress rotated files with gzip.
    pub compress: bool,
    /// Encoding of the records.
    pub encoding: Encoding,
    /// Name rotated files after the local time instead of UTC.
    pub local_time: bool,
    /// Name written into the `logger` key of every record.
    pub logger_name: Option<String>,
    /// Derive placeholders from sequence arguments only.
    ///
    /// See [`Placeholders::Legacy`](crate::Placeholders::Legacy).
    pub legacy_placeholders: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            max_log_size: 100,
            service_name: "app".to_string(),
            info_output: None,
            error_output: None,
            debug_output: None,
            not_display_line: false,
            stdout: true,
            max_backup: 100,
            max_age: 7,
            compress: true,
            encoding: Encoding::Json,
            local_time: false,
            logger_name: None,
            legacy_placeholders: false,
        }
    }
}

/// A named adjustment applied to a [`Config`].
pub type ConfigOption = Box<dyn FnOnce(&mut Config) + Send>;

impl Config {
    /// A configuration with every field empty, zero or `false`.
    ///
    /// Building a context from it logs at info level to `logs/.log` without rotation limits.
    pub fn empty() -> Self {
        Self {
            level: String::new(),
            log_path: PathBuf::new(),
            max_log_size: 0,
            service_name: String::new(),
            info_output: None,
            error_output: None,
            debug_output: None,
            not_display_line: false,
            stdout: false,
            max_backup: 0,
            max_age: 0,
            compress: false,
            encoding: Encoding::Json,
            local_time: false,
            logger_name: None,
            legacy_placeholders: false,
        }
    }

    /// The default configuration adjusted by `options`, in order.
    pub fn with_options(options: impl IntoIterator<Item = ConfigOption>) -> Self {
        let mut config = Config::default();
        config.apply(options);
        config
    }

    /// Apply `options` in order.
    pub fn apply(&mut self, options: impl IntoIterator<Item = ConfigOption>) {
        for option in options {
            option(self);
        }
    }

    /// Do not annotate records with the caller's file and line.
    pub fn set_not_display_line_num(&mut self) {
        self.not_display_line = true;
    }
}

/// Set the minimum level name.
pub fn with_level(level: impl Into<String>) -> ConfigOption {
    let level = level.into();
    Box::new(move |config| config.level = level)
}

/// Enable or disable mirroring to stdout.
pub fn with_stdout(stdout: bool) -> ConfigOption {
    Box::new(move |config| config.stdout = stdout)
}

/// Do not annotate records with the caller's file and line.
pub fn with_not_display_line_num() -> ConfigOption {
    Box::new(|config| config.set_not_display_line_num())
}

/// Set the service name that names the default info log file.
pub fn with_service_name(name: impl Into<String>) -> ConfigOption {
    let name = name.into();
    Box::new(move |config| config.service_name = name)
}

/// Set an explicit info log file.
pub fn with_info_output(path: impl Into<PathBuf>) -> ConfigOption {
    let path = path.into();
    Box::new(move |config| config.info_output = Some(path))
}

/// Set an explicit debug log file.
pub fn with_debug_output(path: impl Into<PathBuf>) -> ConfigOption {
    let path = path.into();
    Box::new(move |config| config.debug_output = Some(path))
}

/// Set an explicit error log file.
pub fn with_error_output(path: impl Into<PathBuf>) -> ConfigOption {
    let path = path.into();
    Box::new(move |config| config.error_output = Some(path))
}

/// Set the directory of the default info log file.
pub fn with_log_path(path: impl Into<PathBuf>) -> ConfigOption {
    let path = path.into();
    Box::new(move |config| config.log_path = path)
}

/// Set the rotation size in megabytes.
pub fn with_max_log_size(megabytes: u64) -> ConfigOption {
    Box::new(move |config| config.max_log_size = megabytes)
}

/// Set the number of rotated files to keep.
pub fn with_max_backup(n: u32) -> ConfigOption {
    Box::new(move |config| config.max_backup = n)
}

/// Set the number of days rotated files are kept.
pub fn with_max_age(days: u32) -> ConfigOption {
    Box::new(move |config| config.max_age = days)
}

/// Enable or disable gzip compression of rotated files.
pub fn with_compress(compress: bool) -> ConfigOption {
    Box::new(move |config| config.compress = compress)
}

/// Set the encoding of the records.
pub fn with_encoding(encoding: Encoding) -> ConfigOption {
    Box::new(move |config| config.encoding = encoding)
}
