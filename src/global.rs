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

//! The process-wide default context.
//!
//! The free functions in this module write through the context installed by [`init`] or
//! [`set_default`]. Before either is called they do nothing, except [`panic`], which still
//! panics.
//!
//! ```
//! use logforth_channels::args;
//! use logforth_channels::config;
//! use logforth_channels::config::Config;
//! use logforth_channels::global;
//!
//! let dir = tempfile::tempdir().unwrap();
//! global::init(Config::with_options([
//!     config::with_log_path(dir.path()),
//!     config::with_stdout(false),
//! ]))
//! .unwrap();
//!
//! global::info(args!["service started on port", 8080]);
//! logforth_channels::warn!("queue is", 90, "percent full");
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::RwLock;

use crate::Arg;
use crate::Error;
use crate::Level;
use crate::LogContext;
use crate::Placeholders;
use crate::config::Config;

static DEFAULT: RwLock<Option<Arc<LogContext>>> = RwLock::new(None);

/// Build a context from `config` and install it as the default, replacing any previous one.
///
/// # Errors
///
/// Return an error if the level name is not recognized. The previous default is kept then.
pub fn init(config: Config) -> Result<(), Error> {
    let ctx = LogContext::new(config)?;
    set_default(ctx);
    Ok(())
}

/// Install `ctx` as the default context and return the previous one.
///
/// Callers still holding the previous context keep writing to its sinks.
pub fn set_default(ctx: LogContext) -> Option<Arc<LogContext>> {
    let mut slot = DEFAULT.write().unwrap_or_else(|e| e.into_inner());
    slot.replace(Arc::new(ctx))
}

/// The current default context, if one has been installed.
pub fn default_context() -> Option<Arc<LogContext>> {
    DEFAULT.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Log at info level through the default context.
#[track_caller]
pub fn info(args: impl AsRef<[Arg]>) {
    if let Some(ctx) = default_context() {
        ctx.info(args);
    }
}

/// Log at debug level through the default context.
#[track_caller]
pub fn debug(args: impl AsRef<[Arg]>) {
    if let Some(ctx) = default_context() {
        ctx.debug(args);
    }
}

/// Log at warn level through the default context.
#[track_caller]
pub fn warn(args: impl AsRef<[Arg]>) {
    if let Some(ctx) = default_context() {
        ctx.warn(args);
    }
}

/// Log at error level through the default context.
#[track_caller]
pub fn error(args: impl AsRef<[Arg]>) {
    if let Some(ctx) = default_context() {
        ctx.error(args);
    }
}

/// Log a space-joined line at error level through the default context.
#[track_caller]
pub fn errorln(args: impl AsRef<[Arg]>) {
    if let Some(ctx) = default_context() {
        ctx.errorln(args);
    }
}

/// Log at panic level through the default context, then panic.
#[track_caller]
pub fn panic(args: impl AsRef<[Arg]>) -> ! {
    match default_context() {
        Some(ctx) => ctx.panic(args),
        None => panic!("{}", Placeholders::Strict.format(args.as_ref())),
    }
}

/// Flush the default context.
pub fn flush() {
    if let Some(ctx) = default_context() {
        ctx.flush();
    }
}

/// Change the minimum level of the default context.
pub fn set_level(level: Level) {
    if let Some(ctx) = default_context() {
        ctx.set_level(level);
    }
}

/// The info log path of the default context.
pub fn info_path() -> Option<PathBuf> {
    default_context().map(|ctx| ctx.info_path().to_path_buf())
}

/// The debug log path of the default context.
pub fn debug_path() -> Option<PathBuf> {
    default_context().map(|ctx| ctx.debug_path().to_path_buf())
}

/// The warn log path of the default context.
pub fn warn_path() -> Option<PathBuf> {
    default_context().map(|ctx| ctx.warn_path().to_path_buf())
}

/// The error log path of the default context.
pub fn error_path() -> Option<PathBuf> {
    default_context().map(|ctx| ctx.error_path().to_path_buf())
}

struct LogCrateLogger(());

impl log::Log for LogCrateLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let Some(ctx) = default_context() else {
            return false;
        };

        log::Log::enabled(ctx.as_ref(), metadata)
    }

    fn log(&self, record: &log::Record) {
        if let Some(ctx) = default_context() {
            log::Log::log(ctx.as_ref(), record);
        }
    }

    fn flush(&self) {
        if let Some(ctx) = default_context() {
            log::Log::flush(ctx.as_ref());
        }
    }
}

/// Set up the log crate global logger.
///
/// Records from the `log` macros are forwarded to the default context installed at the time
/// they are emitted. Records emitted before any context is installed are dropped.
///
/// This function sets the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn try_setup_log_crate() -> Result<(), log::SetLoggerError> {
    static LOGGER: LogCrateLogger = LogCrateLogger(());
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger.
///
/// See [`try_setup_log_crate`].
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
pub fn setup_log_crate() {
    try_setup_log_crate().expect(
        "logforth_channels::global::setup_log_crate must be called before the log crate global logger initialized",
    )
}

/// Log at info level through the default context.
///
/// `info!(a, b)` is shorthand for `global::info(args![a, b])`.
#[macro_export]
macro_rules! info {
    ($($arg:expr),* $(,)?) => {
        $crate::global::info($crate::args![$($arg),*])
    };
}

/// Log at debug level through the default context.
#[macro_export]
macro_rules! debug {
    ($($arg:expr),* $(,)?) => {
        $crate::global::debug($crate::args![$($arg),*])
    };
}

/// Log at warn level through the default context.
#[macro_export]
macro_rules! warn {
    ($($arg:expr),* $(,)?) => {
        $crate::global::warn($crate::args![$($arg),*])
    };
}

/// Log at error level through the default context.
#[macro_export]
macro_rules! error {
    ($($arg:expr),* $(,)?) => {
        $crate::global::error($crate::args![$($arg),*])
    };
}

/// Log a space-joined line at error level through the default context.
#[macro_export]
macro_rules! errorln {
    ($($arg:expr),* $(,)?) => {
        $crate::global::errorln($crate::args![$($arg),*])
    };
}
