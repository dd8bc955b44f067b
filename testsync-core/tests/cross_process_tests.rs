//! Mutual exclusion between real worker processes
//!
//! The test binary re-executes itself: `worker_entry` does nothing in a normal
//! run and plays a worker when the role variable is set.

mod common;

use common::TestFixture;
use serial_test::serial;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use testsync_core::*;

const ROLE_VAR: &str = "TESTSYNC_CROSS_PROCESS_ROLE";
const LOG_VAR: &str = "TESTSYNC_CROSS_PROCESS_LOG";
const TAG_VAR: &str = "TESTSYNC_CROSS_PROCESS_TAG";
const ROUNDS: usize = 3;

fn append(log: &Path, line: String) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log)
        .unwrap();
    file.write_all(format!("{}\n", line).as_bytes()).unwrap();
}

#[test]
fn worker_entry() {
    let Ok(role) = env::var(ROLE_VAR) else {
        return;
    };
    let log = env::var(LOG_VAR).unwrap();
    let tag = env::var(TAG_VAR).unwrap();

    let listener = SyncListener::from_env(&SyncSettings::default());
    assert!(listener.is_enabled());

    for round in 0..ROUNDS {
        let test = TestCase::new(format!("{}::round{}", role, round)).tag(tag.as_str());
        let _guard = listener.guard(&test);
        append(Path::new(&log), format!("start {}", role));
        thread::sleep(Duration::from_millis(40));
        append(Path::new(&log), format!("end {}", role));
    }
}

fn run_workers(payload: &str, tag: &str, log: &Path, roles: &[&str]) {
    let exe = env::current_exe().unwrap();
    let children: Vec<_> = roles
        .iter()
        .map(|role| {
            Command::new(&exe)
                .args(["worker_entry", "--exact", "--nocapture", "--test-threads=1"])
                .env(ROLE_VAR, role)
                .env(LOG_VAR, log)
                .env(TAG_VAR, tag)
                .env(DEFAULT_PROPERTY_NAME, payload)
                .stdout(Stdio::null())
                .spawn()
                .unwrap()
        })
        .collect();

    for mut child in children {
        assert!(child.wait().unwrap().success());
    }
}

fn log_lines(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
#[serial]
fn test_shared_tag_never_overlaps_across_processes() {
    let fixture = TestFixture::new();
    let property = fixture.coordinator.request_sync_property(&["db"]).unwrap();
    let log = fixture.dir.path().join("events.log");
    let roles = ["a", "b", "c"];

    run_workers(property.payload(), "db", &log, &roles);

    let lines = log_lines(&log);
    assert_eq!(lines.len(), roles.len() * ROUNDS * 2);

    // a shared counter of tests inside their guarded body never exceeds one
    let mut inside = 0;
    for pair in lines.chunks(2) {
        for line in pair {
            if line.starts_with("start") {
                inside += 1;
            } else {
                inside -= 1;
            }
            assert!(inside <= 1, "overlapping bodies in {:?}", lines);
        }
        let role = pair[0].trim_start_matches("start ");
        assert_eq!(pair[1], format!("end {}", role));
    }
    assert_eq!(inside, 0);
}

#[test]
#[serial]
fn test_workers_with_unsynchronized_tags_complete() {
    let fixture = TestFixture::new();
    let property = fixture.coordinator.request_sync_property(&["db"]).unwrap();
    let log = fixture.dir.path().join("events.log");

    // workers tag their tests with something the payload does not synchronize
    run_workers(property.payload(), "other", &log, &["a", "b"]);

    let lines = log_lines(&log);
    assert_eq!(lines.len(), 2 * ROUNDS * 2);
}
