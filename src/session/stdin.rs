use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::debug;

/// Forwards stdin lines into the session until EOF or the session hangs up.
///
/// Runs on its own OS thread: a pending terminal read cannot be cancelled,
/// and on tokio's blocking pool it would stall runtime shutdown.
pub fn spawn_stdin_reader(tx: mpsc::Sender<String>) -> io::Result<JoinHandle<io::Result<()>>> {
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                if tx.blocking_send(line?).is_err() {
                    debug!("session gone, stdin reader stopping");
                    break;
                }
            }
            Ok(())
        })
}
