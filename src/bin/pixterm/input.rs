use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use pixterm::keys::{InputDecoder, KeyCommand};
use pixterm::log_debug;
use std::io::{self, Read};
use std::thread;
use std::time::Duration;

/// How long a trailing ESC waits for the rest of its sequence before it counts as Escape.
const ESCAPE_TIMEOUT: Duration = Duration::from_millis(50);
const RAW_CHANNEL_CAPACITY: usize = 32;

/// Read raw stdin on one thread and decode it on another, so a partial escape
/// sequence can time out while the reader is blocked.
pub(crate) fn spawn_input_thread(tx: Sender<KeyCommand>) -> thread::JoinHandle<()> {
    let (raw_tx, raw_rx) = bounded::<Vec<u8>>(RAW_CHANNEL_CAPACITY);
    thread::spawn(move || {
        let mut stdin = io::stdin();
        let mut buf = [0u8; 256];
        loop {
            let n = match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    log_debug(&format!("stdin read error: {err}"));
                    break;
                }
            };
            if raw_tx.send(buf[..n].to_vec()).is_err() {
                break;
            }
        }
    });
    thread::spawn(move || decode_input(&raw_rx, &tx, ESCAPE_TIMEOUT))
}

/// Decode raw chunks into commands until either side of the pipeline closes.
///
/// Input that decodes to nothing still sends `Unknown` so "press any key" waits wake up.
fn decode_input(raw_rx: &Receiver<Vec<u8>>, tx: &Sender<KeyCommand>, escape_timeout: Duration) {
    let mut decoder = InputDecoder::new();
    loop {
        let received = if decoder.has_pending() {
            raw_rx.recv_timeout(escape_timeout)
        } else {
            raw_rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        };
        let commands = match received {
            Ok(chunk) => {
                let commands = decoder.feed(&chunk);
                if commands.is_empty() && decoder.has_pending() {
                    continue;
                }
                commands
            }
            Err(RecvTimeoutError::Timeout) => decoder.flush_pending(),
            Err(RecvTimeoutError::Disconnected) => {
                for command in decoder.flush_pending() {
                    let _ = tx.send(command);
                }
                return;
            }
        };
        let commands = if commands.is_empty() {
            vec![KeyCommand::Unknown]
        } else {
            commands
        };
        for command in commands {
            if tx.send(command).is_err() {
                return;
            }
        }
    }
}
