use tokio::io::{split, AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, trace};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::message::outbound::OutboundLine;
use crate::reader::LineReader;

/// Cloneable handle for queueing lines to the server.
///
/// All clones feed the same writer task, so concurrent senders never
/// interleave bytes of different lines.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<OutboundLine>,
}

impl Outbox {
    /// A bare queue, for driving the writer yourself or for inspecting what
    /// would have been sent.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutboundLine>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub async fn send(&self, line: OutboundLine) -> Result<()> {
        self.tx.send(line).await.map_err(|_| Error::ConnectionClosed)
    }

    /// Send a chat message. Empty text is silently skipped.
    pub async fn privmsg(&self, target: &str, text: &str) -> Result<()> {
        match OutboundLine::privmsg(target, text) {
            Some(line) => self.send(line).await,
            None => Ok(()),
        }
    }

    pub async fn quit(&self, reason: &str) -> Result<()> {
        self.send(OutboundLine::quit(reason)).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Drain the queue into `writer`, one CRLF terminated line at a time.
///
/// Returns once every `Outbox` is dropped, or with the first write error.
pub async fn write_loop<W>(mut writer: W, mut rx: mpsc::Receiver<OutboundLine>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        trace!(line = %line, "send");
        writer.write_all(line.as_str().as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
        writer.flush().await?;
    }
    writer.shutdown().await?;
    Ok(())
}

/// A server connection split into its read side and a serialized write side.
pub struct Connection<S> {
    pub reader: LineReader<ReadHalf<S>>,
    pub outbox: Outbox,
    pub writer: JoinHandle<Result<()>>,
}

impl Connection<TcpStream> {
    pub async fn connect(host: &str, port: u16, queue: usize) -> Result<Self> {
        info!(host, port, "connecting");
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        info!(host, port, "connected");
        Ok(Self::from_stream(stream, queue))
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wrap any duplex byte stream and spawn its writer task.
    pub fn from_stream(stream: S, queue: usize) -> Self {
        let (read_half, write_half) = split(stream);
        let (outbox, rx) = Outbox::channel(queue);
        let writer = tokio::spawn(write_loop(write_half, rx));

        Self {
            reader: LineReader::new(read_half),
            outbox,
            writer,
        }
    }
}

/// Register with the server and join the configured channels.
pub async fn handshake(outbox: &Outbox, config: &Config) -> Result<()> {
    if let Some(password) = &config.server.password {
        outbox.send(OutboundLine::pass(password)).await?;
    }
    outbox
        .send(OutboundLine::user(&config.bot.nickname, config.realname()))
        .await?;
    outbox.send(OutboundLine::nick(&config.bot.nickname)).await?;

    for channel in &config.bot.channels {
        info!(channel = %channel, "joining");
        outbox.send(OutboundLine::join(channel)).await?;
    }
    Ok(())
}
