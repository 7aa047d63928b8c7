//! End-to-end sessions driving the `backup` binary over stdin.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::Duration;

use assert_cmd::cargo::CommandCargoExt;
use predicates::prelude::*;
use test_support::{TempTree, snapshot, wait_until};

const DEADLINE: Duration = Duration::from_secs(15);

struct Session {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl Session {
    fn start() -> Self {
        let mut child = Command::cargo_bin("backup")
            .expect("backup binary")
            .args(["--poll-interval", "50"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn backup");
        let stdin = child.stdin.take();
        Self { child, stdin }
    }

    fn send(&mut self, line: &str) {
        let stdin = self.stdin.as_mut().expect("stdin open");
        writeln!(stdin, "{line}").expect("write command");
        stdin.flush().expect("flush command");
    }

    fn finish(mut self) -> (bool, String) {
        drop(self.stdin.take());
        let output = self.child.wait_with_output().expect("wait for backup");
        (
            output.status.success(),
            String::from_utf8(output.stdout).expect("utf-8 stdout"),
        )
    }
}

fn backup() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("backup").expect("backup binary")
}

fn read(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).ok()
}

#[test]
fn live_session_mirrors_until_ended() {
    let tree = TempTree::new();
    tree.file("proj/a.txt", b"12345").file("proj/docs/readme", b"read me");
    let (src, dst) = (tree.path("proj"), tree.path("backup/proj1"));

    let mut session = Session::start();
    session.send(&format!("add {} {}", src.display(), dst.display()));
    assert!(wait_until(DEADLINE, || snapshot(&src) == snapshot(&dst)));

    fs::write(src.join("a.txt"), b"12345678").expect("grow a.txt");
    assert!(wait_until(DEADLINE, || {
        read(&dst.join("a.txt")).as_deref() == Some(b"12345678")
    }));

    session.send(&format!("end {} {}", src.display(), dst.display()));
    session.send("list");
    thread::sleep(Duration::from_millis(500));
    fs::write(src.join("late.txt"), b"too late").expect("write after end");
    thread::sleep(Duration::from_millis(500));
    assert!(!dst.join("late.txt").exists());

    session.send("exit");
    let (success, stdout) = session.finish();
    assert!(success);
    assert!(stdout.contains(&format!("[OK] Backup started for source: {}", src.display())));
    assert!(stdout.contains(&format!("     -> Target added: {}", dst.display())));
    assert!(stdout.contains(&format!(
        "[OK] Backup stopped: {} -> {}",
        src.display(),
        dst.display()
    )));
    assert!(stdout.contains("No active backups."));
    assert!(stdout.contains("Inactive backups:"));
}

#[test]
fn one_source_feeds_several_targets() {
    let tree = TempTree::new();
    tree.file("src/f", b"data");
    let src = tree.path("src");
    let targets = [tree.path("b1"), tree.path("b2")];

    let mut session = Session::start();
    session.send(&format!(
        "add {} {} {}",
        src.display(),
        targets[0].display(),
        targets[1].display()
    ));
    for target in &targets {
        assert!(wait_until(DEADLINE, || snapshot(&src) == snapshot(target)));
    }
    fs::remove_file(src.join("f")).expect("remove f");
    for target in &targets {
        assert!(wait_until(DEADLINE, || !target.join("f").exists()));
    }

    let (success, stdout) = session.finish();
    assert!(success);
    assert!(stdout.contains("[OK] Stopped 2 backup(s)."));
}

#[test]
fn end_of_input_stops_workers() {
    let tree = TempTree::new();
    tree.file("src/a", b"a");
    let (src, dst) = (tree.path("src"), tree.path("dst"));

    let mut session = Session::start();
    session.send(&format!("add {} {}", src.display(), dst.display()));
    assert!(wait_until(DEADLINE, || dst.join("a").is_file()));
    let (success, _) = session.finish();
    assert!(success);

    fs::write(src.join("b"), b"b").expect("write after exit");
    thread::sleep(Duration::from_millis(500));
    assert!(!dst.join("b").exists());
}

#[test]
fn backup_inside_source_is_rejected() {
    let tree = TempTree::new();
    tree.dir("data/proj");
    let proj = tree.path("data/proj");

    backup()
        .write_stdin(format!("add {} {}/sub\nlist\nexit\n", proj.display(), proj.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[ERROR] Cannot create backup inside source.",
        ))
        .stdout(predicate::str::contains("No active backups."));
    assert!(!proj.join("sub").exists());
}

#[test]
fn non_empty_target_is_rejected() {
    let tree = TempTree::new();
    tree.dir("src").file("full/x", b"x");

    backup()
        .write_stdin(format!(
            "add {} {}\n",
            tree.path("src").display(),
            tree.path("full").display()
        ))
        .assert()
        .success()
        .stdout(predicate::str::contains("[ERROR] Target directory is not empty:"));
}

#[test]
fn restore_rebuilds_source_from_backup() {
    let tree = TempTree::new();
    tree.file("src/keep", b"changed")
        .file("src/junk", b"junk")
        .file("bak/keep", b"original")
        .file("bak/nested/deep", b"deep")
        .symlink("bak/link", "nested/deep");
    let (src, bak) = (tree.path("src"), tree.path("bak"));

    backup()
        .write_stdin(format!("restore {} {}\nexit\n", src.display(), bak.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("[INFO] Restoring backup:"))
        .stdout(predicate::str::contains("[OK] Restore completed successfully."));

    assert_eq!(snapshot(&src), snapshot(&bak));
}

#[test]
fn unknown_command_and_quotes() {
    let tree = TempTree::new();
    tree.dir("my src");

    backup()
        .write_stdin(format!(
            "frobnicate\nadd '{}'\nhelp\n",
            tree.path("my src").display()
        ))
        .assert()
        .success()
        .stdout(predicate::str::contains("[ERROR] Unknown command: frobnicate."))
        .stdout(predicate::str::contains("[ERROR] Invalid arguments. Usage: add"))
        .stdout(predicate::str::contains("Available commands:"));
}

#[test]
fn log_file_receives_status_lines() {
    let tree = TempTree::new();
    tree.dir("src");
    let log = tree.path("session.log");

    backup()
        .arg("--quiet")
        .arg("--log-file")
        .arg(&log)
        .write_stdin("list\nbogus\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("backup> ").not());

    let logged = fs::read_to_string(&log).expect("read log");
    assert!(logged.contains("No active backups."));
    assert!(logged.contains("[ERROR] Unknown command: bogus."));
}

#[test]
fn version_and_help() {
    backup()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("backup "));
    backup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--poll-interval"));
    backup()
        .arg("--no-such-flag")
        .assert()
        .code(1);
}
