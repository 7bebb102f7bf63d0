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

//! The logging context: four severity channels backed by leveled sinks.

use std::backtrace::Backtrace;
use std::backtrace::BacktraceStatus;
use std::num::NonZeroUsize;
use std::panic::Location;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::Arg;
use crate::Error;
use crate::Layout;
use crate::Level;
use crate::Placeholders;
use crate::Sink;
use crate::Trap;
use crate::append::FileBuilder;
use crate::append::Stdout;
use crate::args::format_line;
use crate::clock::Clock;
use crate::config::Config;
use crate::config::DEFAULT_LOG_PATH;
use crate::config::Encoding;
use crate::layout::ConsoleLayout;
use crate::layout::JsonLayout;
use crate::record::Record;
use crate::trap::DefaultTrap;

const MEGABYTE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Info,
    Debug,
    Warn,
    Error,
}

impl Channel {
    fn for_level(level: Level) -> Channel {
        match level {
            Level::Trace | Level::Debug => Channel::Debug,
            Level::Info => Channel::Info,
            Level::Warn => Channel::Warn,
            Level::Error | Level::Panic | Level::Fatal => Channel::Error,
        }
    }
}

#[derive(Debug)]
struct Output {
    sink: Arc<Sink>,
    path: PathBuf,
}

impl Output {
    fn alias(&self) -> Output {
        Output {
            sink: self.sink.clone(),
            path: self.path.clone(),
        }
    }
}

/// An initialized logging context.
///
/// A context owns four channels: info, debug, warn and error. Every channel is bound to one
/// [`Sink`]. Channels without an explicit output share the info sink, so by default every record
/// ends up in `<log_path>/<service_name>.log`.
///
/// # Examples
///
/// ```
/// use logforth_channels::LogContext;
/// use logforth_channels::args;
/// use logforth_channels::config;
/// use logforth_channels::config::Config;
///
/// let dir = tempfile::tempdir().unwrap();
/// let ctx = LogContext::new(Config::with_options([
///     config::with_log_path(dir.path()),
///     config::with_service_name("billing"),
///     config::with_stdout(false),
/// ]))
/// .unwrap();
///
/// ctx.info(args!["charged", 42, "cents"]);
/// ctx.flush();
/// assert_eq!(ctx.info_path(), dir.path().join("billing.log"));
/// ```
#[derive(Debug)]
pub struct LogContext {
    info: Output,
    debug: Output,
    warn: Output,
    error: Output,
    caller: bool,
    logger_name: Option<String>,
    placeholders: Placeholders,
    clock: Clock,
}

impl LogContext {
    /// Build a context from `config`.
    ///
    /// Log files are opened on the first write, so an unwritable path is reported to stderr
    /// when records are emitted rather than here.
    ///
    /// # Errors
    ///
    /// Return an error of kind [`ErrorKind::InvalidLevel`](crate::ErrorKind::InvalidLevel) if
    /// the level name is not recognized.
    pub fn new(config: Config) -> Result<LogContext, Error> {
        let level = Level::from_str(&config.level)?;

        let log_path = if config.log_path.as_os_str().is_empty() {
            PathBuf::from(DEFAULT_LOG_PATH)
        } else {
            config.log_path.clone()
        };
        if !log_path.exists() {
            // best-effort; a missing directory surfaces when the first record is written
            let _ = std::fs::create_dir_all(&log_path);
        }

        // one sink per distinct path, so a file never has two rotating writers
        let mut outputs: Vec<Output> = Vec::with_capacity(3);
        let mut output_for = |path: PathBuf| {
            if let Some(output) = outputs.iter().find(|output| output.path == path) {
                return output.alias();
            }
            let output = Output {
                sink: Arc::new(build_sink(&config, level, &path)),
                path,
            };
            outputs.push(output.alias());
            output
        };

        let info_path = explicit_path(&config.info_output)
            .unwrap_or_else(|| log_path.join(format!("{}.log", config.service_name)));
        let info = output_for(info_path);
        let debug = match explicit_path(&config.debug_output) {
            Some(path) => output_for(path),
            None => info.alias(),
        };
        let error = match explicit_path(&config.error_output) {
            Some(path) => output_for(path),
            None => info.alias(),
        };
        let warn = info.alias();

        let placeholders = if config.legacy_placeholders {
            Placeholders::Legacy
        } else {
            Placeholders::Strict
        };

        Ok(LogContext {
            info,
            debug,
            warn,
            error,
            caller: !config.not_display_line,
            logger_name: config.logger_name.filter(|name| !name.is_empty()),
            placeholders,
            clock: Clock::default(),
        })
    }

    /// Alias of [`LogContext::new`].
    pub fn init(config: Config) -> Result<LogContext, Error> {
        LogContext::new(config)
    }

    fn output(&self, channel: Channel) -> &Output {
        match channel {
            Channel::Info => &self.info,
            Channel::Debug => &self.debug,
            Channel::Warn => &self.warn,
            Channel::Error => &self.error,
        }
    }

    fn sinks(&self) -> Vec<&Arc<Sink>> {
        let mut sinks: Vec<&Arc<Sink>> = Vec::with_capacity(4);
        for output in [&self.info, &self.debug, &self.warn, &self.error] {
            if !sinks.iter().any(|sink| Arc::ptr_eq(sink, &output.sink)) {
                sinks.push(&output.sink);
            }
        }
        sinks
    }

    /// Log at info level on the info channel.
    #[track_caller]
    pub fn info(&self, args: impl AsRef<[Arg]>) {
        self.emit(Channel::Info, Level::Info, args.as_ref(), Location::caller());
    }

    /// Log at debug level on the debug channel.
    #[track_caller]
    pub fn debug(&self, args: impl AsRef<[Arg]>) {
        self.emit(Channel::Debug, Level::Debug, args.as_ref(), Location::caller());
    }

    /// Log at warn level on the warn channel.
    #[track_caller]
    pub fn warn(&self, args: impl AsRef<[Arg]>) {
        self.emit(Channel::Warn, Level::Warn, args.as_ref(), Location::caller());
    }

    /// Log at error level on the error channel.
    #[track_caller]
    pub fn error(&self, args: impl AsRef<[Arg]>) {
        self.emit(Channel::Error, Level::Error, args.as_ref(), Location::caller());
    }

    /// Log at error level on the error channel, joining the arguments with spaces and ending the
    /// message with a newline.
    #[track_caller]
    pub fn errorln(&self, args: impl AsRef<[Arg]>) {
        let sink = &self.error.sink;
        if !sink.enabled(Level::Error) {
            return;
        }
        let message = format_line(args.as_ref());
        self.write(sink, Level::Error, &message, None, Location::caller());
    }

    /// Log at panic level on the error channel, flush it, then panic with the message.
    #[track_caller]
    pub fn panic(&self, args: impl AsRef<[Arg]>) -> ! {
        let message = self.placeholders.format(args.as_ref());
        let backtrace = Backtrace::capture();
        let stacktrace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        let sink = &self.error.sink;
        self.write(
            sink,
            Level::Panic,
            &message,
            stacktrace.as_deref(),
            Location::caller(),
        );
        sink.flush();
        panic!("{message}");
    }

    fn emit(&self, channel: Channel, level: Level, args: &[Arg], location: &Location<'_>) {
        let sink = &self.output(channel).sink;
        if !sink.enabled(level) {
            return;
        }
        let message = self.placeholders.format(args);
        self.write(sink, level, &message, None, location);
    }

    fn write(
        &self,
        sink: &Sink,
        level: Level,
        message: &str,
        stacktrace: Option<&str>,
        location: &Location<'_>,
    ) {
        let (file, line) = if self.caller {
            (Some(location.file()), Some(location.line()))
        } else {
            (None, None)
        };

        let record = Record::builder()
            .time(self.clock.system_time())
            .level(level)
            .logger(self.logger_name.as_deref())
            .file(file)
            .line(line)
            .payload(message)
            .stacktrace(stacktrace)
            .build();
        sink.log(&record);
    }

    /// Flush every sink of this context.
    pub fn flush(&self) {
        for sink in self.sinks() {
            sink.flush();
        }
    }

    /// Change the minimum level of every sink.
    pub fn set_level(&self, level: Level) {
        for sink in self.sinks() {
            sink.set_level(level);
        }
    }

    /// The current minimum level.
    pub fn level(&self) -> Level {
        self.info.sink.level()
    }

    /// The path of the info log file.
    pub fn info_path(&self) -> &Path {
        &self.info.path
    }

    /// The path debug records are written to.
    pub fn debug_path(&self) -> &Path {
        &self.debug.path
    }

    /// The path warn records are written to. Always the info path.
    pub fn warn_path(&self) -> &Path {
        &self.warn.path
    }

    /// The path error records are written to.
    pub fn error_path(&self) -> &Path {
        &self.error.path
    }
}

impl log::Log for LogContext {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let level = Level::from(metadata.level());
        self.output(Channel::for_level(level)).sink.enabled(level)
    }

    fn log(&self, record: &log::Record) {
        let level = Level::from(record.level());
        let sink = &self.output(Channel::for_level(level)).sink;
        if !sink.enabled(level) {
            return;
        }

        let message = record.args().to_string();
        let (file, line) = if self.caller {
            (record.file(), record.line())
        } else {
            (None, None)
        };

        let record = Record::builder()
            .time(self.clock.system_time())
            .level(level)
            .logger(self.logger_name.as_deref())
            .file(file)
            .line(line)
            .payload(&message)
            .build();
        sink.log(&record);
    }

    fn flush(&self) {
        LogContext::flush(self);
    }
}

fn explicit_path(path: &Option<PathBuf>) -> Option<PathBuf> {
    path.as_ref()
        .filter(|path| !path.as_os_str().is_empty())
        .cloned()
}

fn make_layout(encoding: Encoding) -> Box<dyn Layout> {
    match encoding {
        Encoding::Json => Box::new(JsonLayout::default()),
        Encoding::Console => Box::new(ConsoleLayout::default()),
    }
}

fn build_sink(config: &Config, level: Level, path: &Path) -> Sink {
    let mut file = FileBuilder::new(path)
        .layout(make_layout(config.encoding))
        .max_age_days(config.max_age)
        .compress(config.compress)
        .local_time(config.local_time);

    let max_size = config.max_log_size.saturating_mul(MEGABYTE);
    let max_size = usize::try_from(max_size).unwrap_or(usize::MAX);
    if let Some(n) = NonZeroUsize::new(max_size) {
        file = file.rollover_size(n);
    }
    if let Some(n) = NonZeroUsize::new(config.max_backup as usize) {
        file = file.max_backups(n);
    }

    let mut builder = Sink::builder(level);
    match file.build() {
        Ok(file) => builder = builder.append(file),
        Err(err) => DefaultTrap::default().trap(&err.with_context("path", path.display())),
    }
    if config.stdout {
        builder = builder.append(Stdout::default().with_layout(make_layout(config.encoding)));
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::args;
    use crate::config;

    fn config_in(dir: &Path) -> Config {
        Config::with_options([
            config::with_log_path(dir),
            config::with_service_name("unit"),
            config::with_stdout(false),
        ])
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.level = "verbose".to_string();

        let err = LogContext::new(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLevel);
    }

    #[test]
    fn test_channels_alias_info_without_explicit_paths() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LogContext::new(config_in(dir.path())).unwrap();

        let info = dir.path().join("unit.log");
        assert_eq!(ctx.info_path(), info);
        assert_eq!(ctx.debug_path(), info);
        assert_eq!(ctx.warn_path(), info);
        assert_eq!(ctx.error_path(), info);
        assert_eq!(ctx.sinks().len(), 1);
    }

    #[test]
    fn test_explicit_paths_get_their_own_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.debug_output = Some(dir.path().join("debug.log"));
        config.error_output = Some(dir.path().join("error.log"));
        // an empty path counts as unset
        config.info_output = Some(PathBuf::new());

        let ctx = LogContext::new(config).unwrap();
        assert_eq!(ctx.info_path(), dir.path().join("unit.log"));
        assert_eq!(ctx.debug_path(), dir.path().join("debug.log"));
        assert_eq!(ctx.error_path(), dir.path().join("error.log"));
        assert_eq!(ctx.warn_path(), ctx.info_path());
        assert_eq!(ctx.sinks().len(), 3);
    }

    #[test]
    fn test_explicit_paths_equal_to_info_share_its_sink() {
        let dir = tempfile::tempdir().unwrap();
        let info = dir.path().join("unit.log");
        let mut config = config_in(dir.path());
        config.debug_output = Some(info.clone());
        config.error_output = Some(info.clone());

        let ctx = LogContext::new(config).unwrap();
        assert_eq!(ctx.sinks().len(), 1);
        assert!(Arc::ptr_eq(&ctx.debug.sink, &ctx.info.sink));
        assert!(Arc::ptr_eq(&ctx.error.sink, &ctx.info.sink));
        assert_eq!(ctx.error_path(), info);
    }

    #[test]
    fn test_debug_and_error_sharing_a_path_share_a_sink() {
        let dir = tempfile::tempdir().unwrap();
        let shared = dir.path().join("diagnostics.log");
        let mut config = config_in(dir.path());
        config.debug_output = Some(shared.clone());
        config.error_output = Some(shared);

        let ctx = LogContext::new(config).unwrap();
        assert_eq!(ctx.sinks().len(), 2);
        assert!(Arc::ptr_eq(&ctx.debug.sink, &ctx.error.sink));
        assert!(!Arc::ptr_eq(&ctx.debug.sink, &ctx.info.sink));
    }

    #[test]
    fn test_record_time_comes_from_the_clock() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = LogContext::new(config_in(dir.path())).unwrap();
        let now = jiff::Timestamp::from_str("2024-08-10T17:12:52.125Z").unwrap();
        ctx.clock = Clock::manual(now);

        ctx.warn(args!["clock check"]);
        ctx.flush();

        let expected = now
            .to_zoned(jiff::tz::TimeZone::system())
            .strftime("%Y-%m-%dT%H:%M:%S.%3f")
            .to_string();
        let content = std::fs::read_to_string(dir.path().join("unit.log")).unwrap();
        assert!(
            content.starts_with(&format!(r#"{{"time":"{expected}","level":"warn""#)),
            "{content}"
        );
    }

    #[test]
    fn test_set_level_applies_to_every_sink() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.error_output = Some(dir.path().join("error.log"));

        let ctx = LogContext::new(config).unwrap();
        assert_eq!(ctx.level(), Level::Info);
        ctx.set_level(Level::Error);
        for sink in ctx.sinks() {
            assert_eq!(sink.level(), Level::Error);
        }
    }

    #[test]
    fn test_log_crate_levels_map_to_channels() {
        for (level, channel) in [
            (log::Level::Trace, Channel::Debug),
            (log::Level::Debug, Channel::Debug),
            (log::Level::Info, Channel::Info),
            (log::Level::Warn, Channel::Warn),
            (log::Level::Error, Channel::Error),
        ] {
            assert_eq!(Channel::for_level(Level::from(level)), channel);
        }
        assert_eq!(Channel::for_level(Level::Panic), Channel::Error);
    }

    #[test]
    fn test_records_carry_caller_unless_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LogContext::new(config_in(dir.path())).unwrap();
        ctx.info(args!["with caller"]);
        ctx.flush();

        let mut config = config_in(dir.path());
        config.service_name = "quiet".to_string();
        config.set_not_display_line_num();
        let quiet = LogContext::new(config).unwrap();
        quiet.info(args!["without caller"]);
        quiet.flush();

        let with = std::fs::read_to_string(dir.path().join("unit.log")).unwrap();
        assert!(with.contains(r#""linenum":"src/context.rs:"#), "{with}");
        let without = std::fs::read_to_string(dir.path().join("quiet.log")).unwrap();
        assert!(!without.contains("linenum"), "{without}");
        assert!(without.contains(r#""msg":"without caller""#), "{without}");
    }
}
