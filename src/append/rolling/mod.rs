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

//! Size-based rotation of a single log file.
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//! use std::num::NonZeroUsize;
//!
//! use logforth_channels::append::rolling::RollingFileWriter;
//! use logforth_channels::trap::DefaultTrap;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut writer = RollingFileWriter::builder(dir.path().join("app.log"))
//!     .max_file_size(NonZeroUsize::new(10 * 1024 * 1024).unwrap())
//!     .max_backups(NonZeroUsize::new(3).unwrap())
//!     .compress(true)
//!     .trap(DefaultTrap::default())
//!     .build()
//!     .unwrap();
//!
//! writer.write_all(b"hello\n").unwrap();
//! writer.flush().unwrap();
//! assert_eq!(writer.filepath(), dir.path().join("app.log"));
//! assert_eq!(std::fs::read(writer.filepath()).unwrap(), b"hello\n");
//! ```

pub use self::rolling::DEFAULT_MAX_FILE_SIZE;
pub use self::rolling::RollingFileWriter;
pub use self::rolling::RollingFileWriterBuilder;

#[allow(clippy::module_inception)]
mod rolling;
