use std::io::{BufRead, BufReader, Read};
use std::mem;
use std::thread;

use crossbeam_channel::{Receiver, bounded};
use tracing::{debug, warn};

/// Reads `input` line by line on a dedicated thread.
///
/// Lines are delivered as raw bytes without the line terminator, so input
/// that is not valid UTF-8 reaches the parser instead of ending the session.
/// The channel disconnects on end of input or on a read error, which the
/// shell treats as `exit`. The thread is detached: it may stay blocked in
/// `read` after the shell has returned.
pub(crate) fn spawn_reader<R>(input: R) -> Receiver<Vec<u8>>
where
    R: Read + Send + 'static,
{
    let (sender, receiver) = bounded(16);
    let spawned = thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let mut reader = BufReader::new(input);
            let mut line = Vec::new();
            loop {
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        strip_terminator(&mut line);
                        if sender.send(mem::take(&mut line)).is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        warn!(target: "backup::shell", %error, "cannot read command input");
                        return;
                    }
                }
            }
            debug!(target: "backup::shell", "end of command input");
        });
    if let Err(error) = spawned {
        warn!(target: "backup::shell", %error, "cannot start input reader");
    }
    receiver
}

fn strip_terminator(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}
