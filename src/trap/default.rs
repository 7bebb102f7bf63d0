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

use std::io;
use std::io::Write;

use crate::Error;
use crate::trap::Trap;

/// A trap that reports errors on standard error, one line per error.
///
/// Lines are prefixed with `logforth-channels:` so they stand apart from the application's own
/// output. Nothing is reported if standard error is unavailable.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct DefaultTrap {}

impl DefaultTrap {
    fn report(&self, mut out: impl Write, err: &Error) -> io::Result<()> {
        writeln!(out, "logforth-channels: {err}")
    }
}

impl Trap for DefaultTrap {
    fn trap(&self, err: &Error) {
        let _ = self.report(io::stderr().lock(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_is_one_prefixed_line() {
        let err = Error::new("failed to create log file").with_context("path", "logs/app.log");
        let mut out = vec![];
        DefaultTrap::default().report(&mut out, &err).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "logforth-channels: failed to create log file, context: { path: logs/app.log }\n"
        );
    }
}
