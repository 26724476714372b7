use super::SessionId;
use crossbeam::channel::{self, Receiver, Sender};
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{debug, warn};

const READ_CHUNK: usize = 1024;

/// One item on a session's output queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutputEvent {
    Chunk(String),
    /// Pushed exactly once, after the last chunk.
    EndOfStream,
}

/// Starts the background thread that drains `source` into a fresh queue.
///
/// Read faults and panics inside the thread are reported on the queue as a diagnostic
/// line followed by the end-of-stream marker; they never reach the caller.
pub(super) fn spawn_reader<R>(session_id: &SessionId, source: R) -> io::Result<Receiver<OutputEvent>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = channel::unbounded();
    let id = session_id.clone();

    thread::Builder::new()
        .name(reader_thread_name(&id))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| pump(source, &tx)));
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some("reader thread panicked".to_string()),
            };
            if let Some(reason) = failure {
                warn!(session_id = %id, %reason, "Session output reader failed");
                let _ = tx.send(OutputEvent::Chunk(format!(
                    "\n[session reader error: {}]\n",
                    reason
                )));
            }
            debug!(session_id = %id, "Session output closed");
            let _ = tx.send(OutputEvent::EndOfStream);
        })?;

    Ok(rx)
}

fn reader_thread_name(id: &SessionId) -> String {
    format!("turtcd-reader-{}", id.as_str())
}

fn pump<R: Read>(mut source: R, tx: &Sender<OutputEvent>) -> io::Result<()> {
    let mut buf = [0u8; READ_CHUNK];
    let mut decoder = Utf8Decoder::default();

    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let rest = decoder.finish();
                if !rest.is_empty() {
                    let _ = tx.send(OutputEvent::Chunk(rest));
                }
                return Err(e);
            }
        };
        let text = decoder.decode(&buf[..n]);
        // A closed queue means the session was stopped and dropped.
        if !text.is_empty() && tx.send(OutputEvent::Chunk(text)).is_err() {
            return Ok(());
        }
    }

    let rest = decoder.finish();
    if !rest.is_empty() {
        let _ = tx.send(OutputEvent::Chunk(rest));
    }
    Ok(())
}

/// Incremental UTF-8 decoding across read boundaries.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Decodes as much as possible, holding back an incomplete trailing sequence.
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.pending.len());

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flushes whatever is left, replacing an unfinished sequence.
    fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn decoder_reassembles_split_characters() {
        let bytes = "привет".as_bytes();
        let mut decoder = Utf8Decoder::default();
        let mut text = decoder.decode(&bytes[..3]);
        text.push_str(&decoder.decode(&bytes[3..]));
        text.push_str(&decoder.finish());
        assert_eq!(text, "привет");
    }

    #[test]
    fn decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
        assert_eq!(decoder.decode(b"\xd0"), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::other("pipe exploded"));
            }
            self.served = true;
            buf[..2].copy_from_slice(b"ok");
            Ok(2)
        }
    }

    fn collect(rx: &Receiver<OutputEvent>) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.recv_timeout(Duration::from_secs(5)) {
            let done = event == OutputEvent::EndOfStream;
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    #[test]
    fn reader_ends_with_single_sentinel() {
        let id = SessionId::new();
        let rx = spawn_reader(&id, io::Cursor::new(b"hello".to_vec())).expect("spawn reader");
        let events = collect(&rx);
        assert_eq!(
            events,
            vec![
                OutputEvent::Chunk("hello".to_string()),
                OutputEvent::EndOfStream
            ]
        );
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn reader_reports_read_errors_as_output() {
        let id = SessionId::new();
        let rx = spawn_reader(&id, FailingReader { served: false }).expect("spawn reader");
        let events = collect(&rx);
        assert_eq!(events.first(), Some(&OutputEvent::Chunk("ok".to_string())));
        assert!(matches!(
            &events[1],
            OutputEvent::Chunk(line) if line.contains("session reader error: pipe exploded")
        ));
        assert_eq!(events.last(), Some(&OutputEvent::EndOfStream));
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn reader_thread_is_named_after_session() {
        let id = SessionId::from("abc123");
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(reader_thread_name(&id), "turtcd-reader-abc123");
    }
}
