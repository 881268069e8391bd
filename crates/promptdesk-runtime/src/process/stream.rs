//! Child output forwarding (non-UTF8-safe).
//!
//! Dev servers and Python tooling can emit non-UTF8 bytes. `BufReader::lines()`
//! would end the reader task on the first invalid sequence, so lines are read
//! as bytes and decoded lossily.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

/// Which child stream a reader is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Spawn a task re-emitting each line of `stream` as `"{prefix} {line}"`.
///
/// Stdout lines log at `info`, stderr lines at `warn`.
pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    prefix: String,
    kind: StreamKind,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = decode_line(&buf);
                    match kind {
                        StreamKind::Stdout => info!("{prefix} {line}"),
                        StreamKind::Stderr => warn!("{prefix} {line}"),
                    }
                }
                Err(e) => {
                    debug!(%prefix, stream = kind.as_str(), error = %e, "output reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(%prefix, stream = kind.as_str(), "output reader task exiting");
    });
}

/// Strip one trailing `\n` or `\r\n` and decode lossily.
fn decode_line(buf: &[u8]) -> String {
    let mut end = buf.len();
    if end > 0 && buf[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && buf[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_line_endings() {
        assert_eq!(decode_line(b"ready\n"), "ready");
        assert_eq!(decode_line(b"ready\r\n"), "ready");
        assert_eq!(decode_line(b"partial"), "partial");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decode_line(b"a\xffb\n"), "a\u{fffd}b");
    }
}
