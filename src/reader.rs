use futures::Stream;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::message::util::strip_line_ending;
use crate::parser::MAX_LINE_LEN;

/// Upper bound for one read, terminator included.
const MAX_READ: u64 = MAX_LINE_LEN as u64 + 2;

/// Pulls terminated lines off a byte stream.
///
/// Lines come back without CR/LF and decoded lossily, since servers do not
/// agree on an encoding. Overlong lines are skipped and a trailing fragment
/// without a terminator at end of stream is dropped.
pub struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::with_capacity(512, source),
            buf: Vec::with_capacity(512),
        }
    }

    /// Next complete line, or `None` once the peer closed the stream.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            self.buf.clear();
            let n = (&mut self.reader)
                .take(MAX_READ)
                .read_until(b'\n', &mut self.buf)
                .await?;

            if n == 0 {
                return Ok(None);
            }

            if !self.buf.ends_with(b"\n") {
                if n as u64 == MAX_READ {
                    let skipped = n + self.skip_line().await?;
                    warn!(bytes = skipped, "dropping overlong line");
                    continue;
                }
                debug!(bytes = n, "dropping unterminated data at end of stream");
                return Ok(None);
            }

            let line = strip_line_ending(&self.buf);
            return Ok(Some(String::from_utf8_lossy(line).into_owned()));
        }
    }

    async fn skip_line(&mut self) -> Result<usize> {
        let mut skipped = 0;
        loop {
            self.buf.clear();
            let n = (&mut self.reader)
                .take(MAX_READ)
                .read_until(b'\n', &mut self.buf)
                .await?;
            skipped += n;
            if n == 0 || self.buf.ends_with(b"\n") {
                return Ok(skipped);
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<String>> {
        futures::stream::try_unfold(self, |mut reader| async move {
            Ok::<_, Error>(reader.next_line().await?.map(|line| (line, reader)))
        })
    }
}
