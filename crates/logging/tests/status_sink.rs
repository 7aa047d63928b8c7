use std::fs;

use logging::{Severity, StatusSink};

fn rendered(sink: StatusSink<Vec<u8>>) -> String {
    String::from_utf8(sink.into_inner()).expect("utf-8 output")
}

#[test]
fn every_severity_has_its_tag() {
    let mut sink = StatusSink::new(Vec::new());
    sink.ok("started").expect("write");
    sink.info("Restoring backup:").expect("write");
    sink.warn("worker exited").expect("write");
    sink.error("Invalid command").expect("write");
    assert_eq!(
        rendered(sink),
        "[OK] started\n[INFO] Restoring backup:\n[WARN] worker exited\n[ERROR] Invalid command\n"
    );
}

#[test]
fn quiet_hides_chatter_but_not_problems() {
    let mut sink = StatusSink::new(Vec::new()).quiet(true);
    sink.ok("started").expect("write");
    sink.detail(Severity::Ok, "     -> Target added: /b").expect("write");
    sink.prompt("> ").expect("write");
    sink.warn("careful").expect("write");
    sink.error("broken").expect("write");
    sink.plain("No active backups.").expect("write");
    assert_eq!(
        rendered(sink),
        "[WARN] careful\n[ERROR] broken\nNo active backups.\n"
    );
}

#[test]
fn prompt_stays_on_the_line() {
    let mut sink = StatusSink::new(Vec::new());
    sink.prompt("> ").expect("write");
    assert_eq!(rendered(sink), "> ");
}

#[test]
fn log_file_receives_every_line_but_the_prompt() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("session.log");
    fs::write(&log, "earlier\n").expect("seed log");

    let mut sink = StatusSink::new(Vec::new())
        .with_log_file(&log)
        .expect("open log")
        .quiet(true);
    sink.prompt("> ").expect("write");
    sink.ok("Backup stopped: /a -> /b").expect("write");
    sink.error("nope").expect("write");
    drop(sink);

    let contents = fs::read_to_string(&log).expect("read log");
    assert_eq!(contents, "earlier\n[OK] Backup stopped: /a -> /b\n[ERROR] nope\n");
}

#[test]
fn missing_log_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = StatusSink::new(Vec::new()).with_log_file(&dir.path().join("no/such/file"));
    assert!(result.is_err());
}
