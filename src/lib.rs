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

//! A severity-channel logging facade with structured layouts and rotating log files.
//!
//! # Overview
//!
//! A [`LogContext`] owns four channels (info, debug, warn and error). Each channel writes to a
//! leveled [`Sink`], which combines a rotating file appender, an optional stdout mirror and a
//! minimum level. Channels without an explicit output path share the info sink.
//!
//! Records are one JSON object per line by default:
//!
//! ```text
//! {"time":"2024-08-10T17:12:52.125","level":"info","linenum":"src/main.rs:12","msg":"ready"}
//! ```
//!
//! # Examples
//!
//! Owning a context explicitly:
//!
//! ```
//! use logforth_channels::LogContext;
//! use logforth_channels::args;
//! use logforth_channels::config::Config;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let ctx = LogContext::new(Config {
//!     log_path: dir.path().to_path_buf(),
//!     service_name: "billing".to_string(),
//!     stdout: false,
//!     ..Config::default()
//! })
//! .unwrap();
//!
//! ctx.info(args!["invoices sent:", vec![101, 102, 103]]);
//! ctx.errorln(args!["payment failed for", "acme"]);
//! ```
//!
//! Using the process-wide default context:
//!
//! ```
//! use logforth_channels::config;
//! use logforth_channels::config::Config;
//! use logforth_channels::global;
//!
//! let dir = tempfile::tempdir().unwrap();
//! global::init(Config::with_options([
//!     config::with_log_path(dir.path()),
//!     config::with_level("debug"),
//!     config::with_stdout(false),
//! ]))
//! .unwrap();
//!
//! logforth_channels::debug!("cache warmed with", 512, "entries");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod config;
pub mod global;
pub mod layout;
pub mod record;
pub mod trap;

mod args;
mod clock;
mod context;
mod error;
mod level;
mod sink;

pub use self::append::Append;
pub use self::args::Arg;
pub use self::args::Placeholders;
pub use self::args::Value;
pub use self::args::format_line;
pub use self::config::Config;
pub use self::config::Encoding;
pub use self::context::LogContext;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::layout::Layout;
pub use self::level::AtomicLevel;
pub use self::level::Level;
pub use self::sink::Sink;
pub use self::sink::SinkBuilder;
pub use self::trap::Trap;
