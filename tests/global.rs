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

use std::panic::AssertUnwindSafe;
use std::path::Path;

use logforth_channels::ErrorKind;
use logforth_channels::args;
use logforth_channels::config;
use logforth_channels::config::Config;
use logforth_channels::global;

fn config_in(dir: &Path) -> Config {
    Config::with_options([
        config::with_log_path(dir),
        config::with_service_name("global"),
        config::with_stdout(false),
    ])
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

// the default context is process-wide, so the whole lifecycle runs in one test
#[test]
fn test_default_context_lifecycle() {
    // nothing installed yet: writes are dropped, panic still panics
    assert!(global::default_context().is_none());
    assert!(global::info_path().is_none());
    global::info(args!["dropped"]);
    global::errorln(args!["dropped"]);
    global::flush();
    let result = std::panic::catch_unwind(|| global::panic(args!["no context"]));
    assert!(result.is_err());

    let first = tempfile::tempdir().unwrap();
    global::init(config_in(first.path())).unwrap();
    let first_log = first.path().join("global.log");
    assert_eq!(global::info_path(), Some(first_log.clone()));
    assert_eq!(global::warn_path(), Some(first_log.clone()));
    assert_eq!(global::debug_path(), Some(first_log.clone()));
    assert_eq!(global::error_path(), Some(first_log.clone()));

    global::info(args!["first", 1]);
    logforth_channels::warn!("first", 2);
    global::flush();

    // re-initialization replaces the whole context
    let second = tempfile::tempdir().unwrap();
    let error_path = second.path().join("error.log");
    let mut config = config_in(second.path());
    config.error_output = Some(error_path.clone());
    global::init(config).unwrap();
    let second_log = second.path().join("global.log");
    assert_eq!(global::info_path(), Some(second_log.clone()));
    assert_eq!(global::error_path(), Some(error_path.clone()));

    logforth_channels::info!("second", 1);
    logforth_channels::debug!("below level");
    logforth_channels::error!("second", 2);
    logforth_channels::errorln!("second", 3);
    global::flush();

    let first_content = read(&first_log);
    assert_eq!(first_content.lines().count(), 2, "{first_content}");
    assert!(first_content.contains(r#""msg":"first 2""#));
    assert!(!first_content.contains("second"));

    let second_content = read(&second_log);
    assert_eq!(second_content.lines().count(), 1, "{second_content}");
    assert!(second_content.contains(r#""msg":"second 1""#));
    let error_content = read(&error_path);
    assert!(error_content.contains(r#""msg":"second 2""#));
    assert!(error_content.contains(r#""msg":"second 3\n""#));

    // a failed initialization keeps the current default
    let mut bad = config_in(second.path());
    bad.level = "loud".to_string();
    assert_eq!(global::init(bad).unwrap_err().kind(), ErrorKind::InvalidLevel);
    assert_eq!(global::info_path(), Some(second_log.clone()));

    // log crate records follow the default context
    global::setup_log_crate();
    log::info!("bridged {}", 7);
    log::debug!("bridged below level");
    log::error!("bridged error");
    global::set_level(logforth_channels::Level::Trace);
    log::trace!("bridged trace");
    log::debug!("bridged debug");
    global::flush();

    let second_content = read(&second_log);
    assert!(second_content.contains(r#""msg":"bridged 7""#));
    assert!(!second_content.contains("bridged below level"));
    assert!(second_content.contains(r#""msg":"bridged trace""#));
    assert!(second_content.contains(r#""msg":"bridged debug""#));
    assert!(read(&error_path).contains(r#""msg":"bridged error""#));

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        global::panic(args!["shutting down"]);
    }));
    assert!(result.is_err());
    assert!(read(&error_path).contains(r#""level":"panic""#));
}
