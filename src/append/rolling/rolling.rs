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

use std::collections::HashSet;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::GzEncoder;
use jiff::SignedDuration;
use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;

use crate::Error;
use crate::clock::Clock;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S.%3f";
const BACKUP_TIME_PARSE_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.f";
const COMPRESS_SUFFIX: &str = ".gz";

/// Size threshold used when none is configured: 100 megabytes.
pub const DEFAULT_MAX_FILE_SIZE: usize = 100 * 1024 * 1024;

/// A writer for one log file that rotates by size.
///
/// The current file keeps the configured name. On rotation it is renamed to
/// `<stem>-<YYYY-MM-DDTHH-MM-SS.mmm>.<ext>` and a fresh file takes its place. The file is opened
/// lazily on the first write.
#[derive(Debug)]
pub struct RollingFileWriter {
    state: State,
    writer: Option<File>,
}

impl RollingFileWriter {
    /// Creates a new [`RollingFileWriterBuilder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use logforth_channels::append::rolling::RollingFileWriter;
    ///
    /// let builder = RollingFileWriter::builder("logs/app.log");
    /// ```
    #[must_use]
    pub fn builder(filepath: impl Into<PathBuf>) -> RollingFileWriterBuilder {
        RollingFileWriterBuilder::new(filepath)
    }

    /// The path of the current log file.
    pub fn filepath(&self) -> &Path {
        &self.state.filepath
    }
}

impl Drop for RollingFileWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut()
            && let Err(err) = writer.flush()
        {
            let err = Error::new("failed to flush file writer on dropped").with_source(err);
            self.state.trap.trap(&err);
        }
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len();
        if len > self.state.max_size {
            return Err(io::Error::other(format!(
                "write length {len} exceeds maximum file size {}",
                self.state.max_size
            )));
        }

        let mut writer = match self.writer.take() {
            Some(writer) => writer,
            None => self
                .state
                .open_existing_or_new(len)
                .map_err(io::Error::other)?,
        };

        if self.state.should_rollover_on_size(len) {
            self.state.refresh_writer(&mut writer);
        }

        let result = writer
            .write(buf)
            .inspect(|&n| self.state.current_filesize += n);
        self.writer = Some(writer);
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// A builder for configuring [`RollingFileWriter`].
#[derive(Debug)]
pub struct RollingFileWriterBuilder {
    // required
    filepath: PathBuf,

    // has default
    max_size: Option<NonZeroUsize>,
    max_backups: Option<NonZeroUsize>,
    max_age: Option<SignedDuration>,
    compress: bool,
    local_time: bool,
    clock: Clock,
    trap: Box<dyn Trap>,
}

impl RollingFileWriterBuilder {
    /// Creates a new [`RollingFileWriterBuilder`].
    #[must_use]
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            max_size: None,
            max_backups: None,
            max_age: None,
            compress: false,
            local_time: false,
            clock: Clock::System,
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the trap for the rolling file writer.
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Set the maximum size of a log file in bytes.
    ///
    /// Default to [`DEFAULT_MAX_FILE_SIZE`].
    #[must_use]
    pub fn max_file_size(mut self, n: NonZeroUsize) -> Self {
        self.max_size = Some(n);
        self
    }

    /// Set the maximum number of rotated files to keep.
    ///
    /// Default to keep all of them.
    #[must_use]
    pub fn max_backups(mut self, n: NonZeroUsize) -> Self {
        self.max_backups = Some(n);
        self
    }

    /// Set the maximum age of rotated files, judged by the timestamp in their names.
    ///
    /// Default to keep them regardless of age.
    #[must_use]
    pub fn max_age(mut self, age: SignedDuration) -> Self {
        self.max_age = Some(age);
        self
    }

    /// Compress rotated files with gzip.
    #[must_use]
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Use the system timezone for the timestamps in rotated file names instead of UTC.
    #[must_use]
    pub fn local_time(mut self, local_time: bool) -> Self {
        self.local_time = local_time;
        self
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the [`RollingFileWriter`].
    ///
    /// No file is touched until the first write.
    ///
    /// # Errors
    ///
    /// Return an error if the path has no file name.
    pub fn build(self) -> Result<RollingFileWriter, Error> {
        let Self {
            filepath,
            max_size,
            max_backups,
            max_age,
            compress,
            local_time,
            clock,
            trap,
        } = self;

        let stem = filepath
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| {
                Error::new("log file path must end with a UTF-8 file name")
                    .with_context("path", filepath.display())
            })?
            .to_string();
        let extension = filepath
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let log_dir = match filepath.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let timezone = if local_time {
            TimeZone::system()
        } else {
            TimeZone::UTC
        };

        let state = State {
            filepath,
            log_dir,
            stem,
            extension,
            max_size: max_size.map_or(DEFAULT_MAX_FILE_SIZE, |n| n.get()),
            max_backups,
            max_age,
            compress,
            timezone,
            current_filesize: 0,
            clock,
            trap,
        };

        Ok(RollingFileWriter {
            state,
            writer: None,
        })
    }
}

#[derive(Debug)]
struct Backup {
    filepath: PathBuf,
    // file name without the compress suffix
    name: String,
    timestamp: Timestamp,
    compressed: bool,
}

#[derive(Debug)]
struct State {
    filepath: PathBuf,
    log_dir: PathBuf,
    stem: String,
    extension: String,
    max_size: usize,
    max_backups: Option<NonZeroUsize>,
    max_age: Option<SignedDuration>,
    compress: bool,
    timezone: TimeZone,
    current_filesize: usize,
    clock: Clock,
    trap: Box<dyn Trap>,
}

impl State {
    fn open_existing_or_new(&mut self, len: usize) -> Result<File, Error> {
        fs::create_dir_all(&self.log_dir).map_err(|err| {
            Error::new("failed to create log directory")
                .with_context("path", self.log_dir.display())
                .with_source(err)
        })?;

        let metadata = match fs::metadata(&self.filepath) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return self.create_log_writer(),
            Err(err) => {
                return Err(Error::new("failed to stat current log")
                    .with_context("path", self.filepath.display())
                    .with_source(err));
            }
        };

        let filesize = metadata.len() as usize;
        if filesize + len >= self.max_size {
            return self.rotate_log_writer();
        }

        // continue to use the existing current log file
        let file = OpenOptions::new()
            .append(true)
            .open(&self.filepath)
            .map_err(|err| {
                Error::new("failed to open current log")
                    .with_context("path", self.filepath.display())
                    .with_source(err)
            })?;
        self.current_filesize = filesize;
        Ok(file)
    }

    fn create_log_writer(&mut self) -> Result<File, Error> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.filepath)
            .map_err(|err| {
                Error::new("failed to create log file")
                    .with_context("path", self.filepath.display())
                    .with_source(err)
            })?;
        self.current_filesize = 0;
        Ok(file)
    }

    fn backup_filepath(&self, now: Timestamp) -> PathBuf {
        let mut ts = now;
        loop {
            let date = ts
                .to_zoned(self.timezone.clone())
                .strftime(BACKUP_TIME_FORMAT)
                .to_string();
            let filepath = self
                .log_dir
                .join(format!("{}-{date}{}", self.stem, self.extension));

            // two rotations within the same millisecond must not overwrite each other
            let taken = fs::exists(&filepath).is_ok_and(|ok| ok)
                || fs::exists(compressed_filepath(&filepath)).is_ok_and(|ok| ok);
            if !taken {
                return filepath;
            }
            match ts.checked_add(SignedDuration::from_millis(1)) {
                Ok(next) => ts = next,
                Err(_) => return filepath,
            }
        }
    }

    fn rotate_log_writer(&mut self) -> Result<File, Error> {
        let now = self.clock.now();

        if fs::exists(&self.filepath).is_ok_and(|ok| ok) {
            let backup = self.backup_filepath(now);
            fs::rename(&self.filepath, &backup).map_err(|err| {
                Error::new("failed to archive log")
                    .with_context("path", self.filepath.display())
                    .with_source(err)
            })?;
        }

        let file = self.create_log_writer()?;

        if let Err(err) = self.delete_and_compress_backups(now) {
            let err = Error::new("failed to clean up rotated logs").with_source(err);
            self.trap.trap(&err);
        }

        Ok(file)
    }

    fn refresh_writer(&mut self, file: &mut File) {
        match self.rotate_log_writer() {
            Ok(new_file) => {
                if let Err(err) = file.flush() {
                    let err = Error::new("failed to flush previous writer").with_source(err);
                    self.trap.trap(&err);
                }
                *file = new_file;
            }
            Err(err) => {
                let err = Error::new("failed to rotate log writer").with_source(err);
                self.trap.trap(&err);
            }
        }
    }

    fn list_backups(&self) -> Result<Vec<Backup>, Error> {
        let read_dir = fs::read_dir(&self.log_dir).map_err(|err| {
            Error::new(format!(
                "failed to read log dir: {}",
                self.log_dir.display()
            ))
            .with_source(err)
        })?;

        let prefix = format!("{}-", self.stem);
        let files = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let metadata = entry.metadata().ok()?;
                // the writer only creates files, not directories or symlinks
                if !metadata.is_file() {
                    return None;
                }

                let filename = entry.file_name();
                // if the filename is not a UTF-8 string, skip it.
                let filename = filename.to_str()?;
                let (name, compressed) = match filename.strip_suffix(COMPRESS_SUFFIX) {
                    Some(name) => (name, true),
                    None => (filename, false),
                };

                let datetime = name
                    .strip_prefix(&prefix)?
                    .strip_suffix(self.extension.as_str())?;
                let datetime = DateTime::strptime(BACKUP_TIME_PARSE_FORMAT, datetime).ok()?;
                let timestamp = datetime.to_zoned(self.timezone.clone()).ok()?.timestamp();

                Some(Backup {
                    filepath: entry.path(),
                    name: name.to_string(),
                    timestamp,
                    compressed,
                })
            })
            .collect::<Vec<_>>();

        Ok(files)
    }

    fn delete_and_compress_backups(&self, now: Timestamp) -> Result<(), Error> {
        if self.max_backups.is_none() && self.max_age.is_none() && !self.compress {
            return Ok(());
        }

        let mut backups = self.list_backups()?;
        // newest first
        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut removals = vec![];
        if let Some(max_backups) = self.max_backups {
            // a plain backup and its compressed twin count once
            let mut preserved = HashSet::new();
            let mut remaining = vec![];
            for backup in backups {
                preserved.insert(backup.name.clone());
                if preserved.len() > max_backups.get() {
                    removals.push(backup);
                } else {
                    remaining.push(backup);
                }
            }
            backups = remaining;
        }

        if let Some(max_age) = self.max_age
            && let Ok(cutoff) = now.checked_sub(max_age)
        {
            let (expired, remaining): (Vec<_>, Vec<_>) = backups
                .into_iter()
                .partition(|backup| backup.timestamp < cutoff);
            removals.extend(expired);
            backups = remaining;
        }

        for backup in removals.iter() {
            let filepath = &backup.filepath;
            fs::remove_file(filepath).map_err(|err| {
                Error::new(format!("failed to remove old log: {}", filepath.display()))
                    .with_source(err)
            })?;
        }

        if self.compress {
            for backup in backups.iter().filter(|backup| !backup.compressed) {
                compress_log(&backup.filepath)?;
            }
        }

        Ok(())
    }

    fn should_rollover_on_size(&self, len: usize) -> bool {
        self.current_filesize + len > self.max_size
    }
}

fn compressed_filepath(filepath: &Path) -> PathBuf {
    let mut name = filepath.as_os_str().to_owned();
    name.push(COMPRESS_SUFFIX);
    PathBuf::from(name)
}

fn compress_log(filepath: &Path) -> Result<(), Error> {
    let target = compressed_filepath(filepath);
    let failed = |message: &str, err: io::Error| {
        Error::new(message.to_string())
            .with_context("path", filepath.display())
            .with_source(err)
    };

    let mut input = File::open(filepath).map_err(|err| failed("failed to open log", err))?;
    let output = File::create(&target).map_err(|err| failed("failed to create archive", err))?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder).map_err(|err| failed("failed to compress log", err))?;
    encoder
        .finish()
        .map_err(|err| failed("failed to finish archive", err))?;

    fs::remove_file(filepath).map_err(|err| failed("failed to remove compressed log", err))
}
