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

use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use jiff::SignedDuration;

use crate::Error;
use crate::Layout;
use crate::append::Append;
use crate::append::rolling::RollingFileWriter;
use crate::append::rolling::RollingFileWriterBuilder;
use crate::layout::JsonLayout;
use crate::record::Record;

/// A builder to configure and create a [`File`] appender.
#[derive(Debug)]
pub struct FileBuilder {
    builder: RollingFileWriterBuilder,
    layout: Box<dyn Layout>,
}

impl FileBuilder {
    /// Create a new file appender builder writing to `filepath`.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            builder: RollingFileWriterBuilder::new(filepath),
            layout: Box::new(JsonLayout::default()),
        }
    }

    /// Build the [`File`] appender.
    ///
    /// # Errors
    ///
    /// Return an error if the configured path has no file name.
    pub fn build(self) -> Result<File, Error> {
        let FileBuilder { builder, layout } = self;
        let writer = builder.build()?;
        Ok(File::new(writer, layout))
    }

    /// Set the layout for the logs.
    ///
    /// Default to [`JsonLayout`].
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Roll over the log file once it would exceed the given size in bytes.
    pub fn rollover_size(mut self, n: NonZeroUsize) -> Self {
        self.builder = self.builder.max_file_size(n);
        self
    }

    /// Set the maximum number of rotated files to keep.
    pub fn max_backups(mut self, n: NonZeroUsize) -> Self {
        self.builder = self.builder.max_backups(n);
        self
    }

    /// Remove rotated files older than the given number of days.
    pub fn max_age_days(mut self, days: u32) -> Self {
        if days > 0 {
            let age = SignedDuration::from_hours(i64::from(days) * 24);
            self.builder = self.builder.max_age(age);
        }
        self
    }

    /// Compress rotated files with gzip.
    pub fn compress(mut self, compress: bool) -> Self {
        self.builder = self.builder.compress(compress);
        self
    }

    /// Name rotated files after the local time instead of UTC.
    pub fn local_time(mut self, local_time: bool) -> Self {
        self.builder = self.builder.local_time(local_time);
        self
    }
}

/// An appender that writes log records to a rotating file.
#[derive(Debug)]
pub struct File {
    writer: Mutex<RollingFileWriter>,
    layout: Box<dyn Layout>,
}

impl File {
    fn new(writer: RollingFileWriter, layout: Box<dyn Layout>) -> Self {
        let writer = Mutex::new(writer);
        Self { writer, layout }
    }

    fn writer(&self) -> MutexGuard<'_, RollingFileWriter> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Append for File {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        let mut writer = self.writer();
        writer.write_all(&bytes).map_err(Error::from_io_error)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        let mut writer = self.writer();
        writer.flush().map_err(Error::from_io_error)?;
        Ok(())
    }
}
