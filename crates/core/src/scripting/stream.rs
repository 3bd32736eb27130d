//! Output events and the per-pipe line reader.
//!
//! Both pipes of a child feed one bounded channel. Each message is a whole
//! chunk, so the consumer never sees a chunk from one pipe split by a chunk
//! from the other. Order is preserved within a pipe only.
//!
//! Bytes are forwarded verbatim. Lines longer than [`MAX_CHUNK_BYTES`] span
//! several chunks; only the first of them starts a line.

use std::fmt;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;

/// Longest chunk forwarded in one event. Longer lines continue in the next.
pub const MAX_CHUNK_BYTES: usize = 8 * 1024;

/// Marker placed before every stderr line once merged with stdout.
pub const STDERR_PREFIX: &str = "ERROR: ";

/// Which pipe a chunk was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// One piece of output, at most [`MAX_CHUNK_BYTES`] long.
///
/// A chunk ends with `\n` unless its line continues in the next chunk of the
/// same pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub data: Vec<u8>,
    /// `false` for the continuation of a line cut at the chunk cap.
    pub line_start: bool,
}

impl OutputChunk {
    /// A chunk that begins a new line.
    pub fn line(stream: OutputStream, data: impl Into<Vec<u8>>) -> Self {
        Self {
            stream,
            data: data.into(),
            line_start: true,
        }
    }
}

/// Everything a run reports, in the order it reports it.
///
/// `Exited` is always the final event of a completed run. A cancelled run
/// ends without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Output(OutputChunk),
    /// Process terminated. `code` is `-1` if it was killed by a signal.
    Exited { code: i32 },
}

impl ProcessEvent {
    /// Render the event as response body bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Output(OutputChunk {
                stream: OutputStream::Stderr,
                data,
                line_start: true,
            }) => {
                let mut out = Vec::with_capacity(STDERR_PREFIX.len() + data.len());
                out.extend_from_slice(STDERR_PREFIX.as_bytes());
                out.extend_from_slice(&data);
                out
            }
            Self::Output(OutputChunk { data, .. }) => data,
            Self::Exited { code } => exit_trailer(code).into_bytes(),
        }
    }
}

/// Final line of every completed run's body.
pub fn exit_trailer(code: i32) -> String {
    format!("Process exited with code {code}")
}

/// Read `reader` line by line and forward each line to `tx`.
///
/// Returns when the pipe closes, a read fails (logged, treated as end of
/// stream) or the receiver is gone. A last line without a newline gets one,
/// so whatever follows on the body starts on its own line.
pub async fn forward_lines<R>(reader: R, stream: OutputStream, tx: mpsc::Sender<ProcessEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line_start = true;

    loop {
        let mut data = Vec::new();
        let read = (&mut reader)
            .take(MAX_CHUNK_BYTES as u64)
            .read_until(b'\n', &mut data)
            .await;

        let failed = match read {
            Ok(0) => break,
            Ok(_) => false,
            Err(e) => {
                tracing::warn!(%stream, error = %e, "Failed to read process output");
                true
            }
        };

        // A failed read may still have filled part of `data`.
        if !data.is_empty() {
            let ends_line = data.last() == Some(&b'\n');
            let chunk = OutputChunk {
                stream,
                data,
                line_start,
            };
            line_start = ends_line;
            if tx.send(ProcessEvent::Output(chunk)).await.is_err() {
                return;
            }
        }
        if failed {
            break;
        }
    }

    if !line_start {
        let end = OutputChunk {
            stream,
            data: b"\n".to_vec(),
            line_start: false,
        };
        let _ = tx.send(ProcessEvent::Output(end)).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
