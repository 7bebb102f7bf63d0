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

use std::io::Read;
use std::panic::AssertUnwindSafe;
use std::path::Path;

use flate2::read::GzDecoder;
use logforth_channels::Encoding;
use logforth_channels::LogContext;
use logforth_channels::args;
use logforth_channels::config;
use logforth_channels::config::Config;
use serde_json::Value;

fn config_in(dir: &Path) -> Config {
    Config {
        log_path: dir.to_path_buf(),
        service_name: "test".to_string(),
        stdout: false,
        ..Config::default()
    }
}

fn read_records(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn messages(path: &Path) -> Vec<String> {
    read_records(path)
        .into_iter()
        .map(|record| record["msg"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_debug_goes_to_info_file_without_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.level = "debug".to_string();

    let ctx = LogContext::new(config).unwrap();
    ctx.debug(args!["cache miss"]);
    ctx.info(args!["request served"]);
    ctx.flush();

    assert_eq!(
        messages(&dir.path().join("test.log")),
        vec!["cache miss", "request served"]
    );
}

#[test]
fn test_debug_goes_only_to_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let debug_path = dir.path().join("debug.log");
    let ctx = LogContext::new(Config::with_options([
        config::with_log_path(dir.path()),
        config::with_service_name("test"),
        config::with_stdout(false),
        config::with_level("debug"),
        config::with_debug_output(&debug_path),
    ]))
    .unwrap();

    ctx.debug(args!["cache miss"]);
    ctx.info(args!["request served"]);
    ctx.flush();

    assert_eq!(messages(&debug_path), vec!["cache miss"]);
    assert_eq!(
        messages(&dir.path().join("test.log")),
        vec!["request served"]
    );
}

#[test]
fn test_error_and_warn_routing() {
    let dir = tempfile::tempdir().unwrap();
    let error_path = dir.path().join("error.log");
    let mut config = config_in(dir.path());
    config.error_output = Some(error_path.clone());

    let ctx = LogContext::new(config).unwrap();
    ctx.warn(args!["disk at", 91, "percent"]);
    ctx.error(args!["disk full"]);
    ctx.flush();

    let info = read_records(&dir.path().join("test.log"));
    assert_eq!(info.len(), 1);
    assert_eq!(info[0]["level"], "warn");
    assert_eq!(info[0]["msg"], "disk at 91 percent");

    let error = read_records(&error_path);
    assert_eq!(error.len(), 1);
    assert_eq!(error[0]["level"], "error");
    assert_eq!(error[0]["msg"], "disk full");
}

#[test]
fn test_records_below_level_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.level = "warn".to_string();

    let ctx = LogContext::new(config).unwrap();
    ctx.debug(args!["dropped"]);
    ctx.info(args!["dropped too"]);
    ctx.warn(args!["kept"]);
    ctx.flush();

    assert_eq!(messages(&dir.path().join("test.log")), vec!["kept"]);
}

#[test]
fn test_set_level_at_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = LogContext::new(config_in(dir.path())).unwrap();

    ctx.debug(args!["dropped"]);
    ctx.set_level(logforth_channels::Level::Debug);
    ctx.debug(args!["kept"]);
    ctx.flush();

    assert_eq!(messages(&dir.path().join("test.log")), vec!["kept"]);
}

#[test]
fn test_message_formatting() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = LogContext::new(config_in(dir.path())).unwrap();

    ctx.info(args![vec![1, 2, 3]]);
    ctx.info(args!["user", 7, "logged in", true]);
    ctx.errorln(args!["a", "b"]);
    ctx.errorln(args!["ids", vec![4, 5]]);
    ctx.flush();

    assert_eq!(
        messages(&dir.path().join("test.log")),
        vec!["1 2 3", "user 7 logged in true", "a b\n", "ids [4 5]\n"]
    );
}

#[test]
fn test_legacy_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.legacy_placeholders = true;
    config.logger_name = Some("billing".to_string());

    let ctx = LogContext::new(config).unwrap();
    ctx.info(args![vec![1, 2, 3]]);
    ctx.info(args![String::from("aaa")]);
    ctx.flush();

    let records = read_records(&dir.path().join("test.log"));
    assert_eq!(records[0]["msg"], "1 2 3");
    assert_eq!(records[1]["msg"], "%!(EXTRA String=aaa)");
    assert_eq!(records[1]["logger"], "billing");
}

#[test]
fn test_json_record_fields() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = LogContext::new(config_in(dir.path())).unwrap();
    ctx.info(args!["hello"]);
    ctx.flush();

    let records = read_records(&dir.path().join("test.log"));
    let record = records[0].as_object().unwrap();
    assert_eq!(record["level"], "info");
    assert_eq!(record["msg"], "hello");
    assert!(!record.contains_key("logger"));
    assert!(!record.contains_key("stacktrace"));

    let linenum = record["linenum"].as_str().unwrap();
    assert!(linenum.starts_with("tests/channels.rs:"), "{linenum}");

    // e.g. 2024-08-10T17:12:52.125
    let time = record["time"].as_str().unwrap();
    assert_eq!(time.len(), 23, "{time}");
    assert_eq!(&time[10..11], "T");
    assert_eq!(&time[19..20], ".");
}

#[test]
fn test_console_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.encoding = Encoding::Console;
    config.not_display_line = true;

    let ctx = LogContext::new(config).unwrap();
    ctx.warn(args!["low memory"]);
    ctx.flush();

    let content = std::fs::read_to_string(dir.path().join("test.log")).unwrap();
    let fields = content.trim_end().split('\t').collect::<Vec<_>>();
    assert_eq!(fields.len(), 3, "{content}");
    assert_eq!(fields[1], "warn");
    assert_eq!(fields[2], "low memory");
}

#[test]
fn test_panic_writes_record_then_panics() {
    let dir = tempfile::tempdir().unwrap();
    let error_path = dir.path().join("error.log");
    let mut config = config_in(dir.path());
    config.error_output = Some(error_path.clone());

    let ctx = LogContext::new(config).unwrap();
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        ctx.panic(args!["invariant broken:", 42]);
    }));

    let payload = result.unwrap_err();
    let message = payload.downcast_ref::<String>().unwrap();
    assert_eq!(message, "invariant broken: 42");

    let records = read_records(&error_path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "panic");
    assert_eq!(records[0]["msg"], "invariant broken: 42");
}

#[test]
#[should_panic(expected = "unrecoverable")]
fn test_panic_is_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = LogContext::new(config_in(dir.path())).unwrap();
    ctx.panic(args!["unrecoverable"]);
}

#[test]
fn test_rotation_settings_reach_the_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.max_log_size = 1;
    config.max_backup = 1;
    config.compress = true;

    let ctx = LogContext::new(config).unwrap();
    // roughly 1.1 MiB of records, enough for exactly one rotation
    let payload = "x".repeat(1000);
    for i in 0..1100 {
        ctx.info(args![i, payload.as_str()]);
    }
    ctx.flush();

    let mut backups = vec![];
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let name = entry.unwrap().file_name().into_string().unwrap();
        if name != "test.log" {
            backups.push(name);
        }
    }
    assert_eq!(backups.len(), 1, "{backups:?}");
    let backup = &backups[0];
    assert!(backup.starts_with("test-") && backup.ends_with(".log.gz"), "{backup}");

    let mut archived = String::new();
    let archive = std::fs::File::open(dir.path().join(backup)).unwrap();
    GzDecoder::new(archive).read_to_string(&mut archived).unwrap();
    let first = serde_json::from_str::<Value>(archived.lines().next().unwrap()).unwrap();
    assert_eq!(first["msg"], format!("0 {payload}"));

    let archived_lines = archived.lines().count();
    let current_lines = read_records(&dir.path().join("test.log")).len();
    assert_eq!(archived_lines + current_lines, 1100);
    assert!(archived.len() <= 1024 * 1024);
}

#[test]
fn test_concurrent_emission() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = LogContext::new(config_in(dir.path())).unwrap();

    std::thread::scope(|s| {
        for t in 0..4 {
            let ctx = &ctx;
            s.spawn(move || {
                for i in 0..50 {
                    ctx.info(args!["thread", t, "line", i]);
                }
            });
        }
    });
    ctx.flush();

    // every line is a complete record
    assert_eq!(read_records(&dir.path().join("test.log")).len(), 200);
}
