use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, trace, warn};

use crate::config::Config;
use crate::connection::{handshake, Connection, Outbox};
use crate::dispatch::CommandRegistry;
use crate::error::{Error, Result};
use crate::message::outbound::OutboundLine;
use crate::message::ParsedMessage;
use crate::ping;
use crate::router::{ChatterHook, Routed, Router, Silent};

const QUIT_MESSAGE: &str = "bye";

/// One session against one server.
pub struct Bot<S> {
    config: Arc<Config>,
    connection: Connection<S>,
    registry: CommandRegistry,
    chatter: Arc<dyn ChatterHook>,
}

impl<S> Bot<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(config: Arc<Config>, connection: Connection<S>, registry: CommandRegistry) -> Self {
        Self {
            config,
            connection,
            registry,
            chatter: Arc::new(Silent),
        }
    }

    pub fn with_chatter(mut self, chatter: Arc<dyn ChatterHook>) -> Self {
        self.chatter = chatter;
        self
    }

    /// Register, then route inbound lines until the server hangs up, the
    /// connection fails or `shutdown` resolves.
    ///
    /// `PING` is answered by the reader itself. Every other line gets its own
    /// task, at most `limits.max_in_flight` of them at once. Lines arriving
    /// while all slots are busy wait in a backlog of `limits.backlog` entries;
    /// past that they are dropped.
    ///
    /// After end of stream the running tasks are awaited. On shutdown or a
    /// writer failure they are aborted.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let Connection {
            reader,
            outbox,
            mut writer,
        } = self.connection;

        handshake(&outbox, &self.config).await?;

        let limits = self.config.limits.clone();
        let router = Arc::new(
            Router::new(self.config.clone(), self.registry, outbox.clone()).with_chatter(self.chatter),
        );
        let mut tasks: JoinSet<Result<Routed>> = JoinSet::new();
        let mut backlog: VecDeque<String> = VecDeque::new();

        let lines = reader.into_stream();
        futures::pin_mut!(lines);
        tokio::pin!(shutdown);

        let mut writer_done = false;
        let mut drain = false;

        let outcome = loop {
            tokio::select! {
                next = lines.next() => match next {
                    Some(Ok(line)) => {
                        debug!(line = %line, "recv");
                        if let Some(pong) = ping_reply(&line) {
                            if let Err(error) = outbox.send(pong).await {
                                break Err(error);
                            }
                        } else if tasks.len() < limits.max_in_flight {
                            spawn_route(&mut tasks, &router, line);
                        } else if backlog.len() < limits.backlog {
                            backlog.push_back(line);
                        } else {
                            warn!(line = %line, in_flight = tasks.len(), "backlog full, dropping line");
                        }
                    }
                    Some(Err(error)) => break Err(error),
                    None => {
                        info!("server closed the connection");
                        drain = true;
                        break Ok(());
                    }
                },
                Some(done) = tasks.join_next(), if !tasks.is_empty() => {
                    log_finished(done);
                    if let Some(line) = backlog.pop_front() {
                        spawn_route(&mut tasks, &router, line);
                    }
                }
                finished = &mut writer => {
                    writer_done = true;
                    break match flatten_writer(finished) {
                        Ok(()) => Err(Error::ConnectionClosed),
                        Err(error) => Err(error),
                    };
                }
                _ = &mut shutdown => {
                    quit(&outbox).await;
                    break Ok(());
                }
            }
        };

        // backlog is only non-empty while every slot is taken
        while drain {
            tokio::select! {
                done = tasks.join_next() => match done {
                    Some(done) => {
                        log_finished(done);
                        if let Some(line) = backlog.pop_front() {
                            spawn_route(&mut tasks, &router, line);
                        }
                    }
                    None => drain = false,
                },
                _ = &mut shutdown => {
                    quit(&outbox).await;
                    drain = false;
                }
            }
        }

        if !backlog.is_empty() {
            debug!(lines = backlog.len(), "discarding backlog");
        }
        tasks.abort_all();
        while let Some(done) = tasks.join_next().await {
            log_finished(done);
        }

        // the writer exits once the last outbox handle is gone
        drop(router);
        drop(outbox);
        let flushed = if writer_done {
            Ok(())
        } else {
            flatten_writer(writer.await)
        };

        outcome.and(flushed)
    }
}

fn ping_reply(line: &str) -> Option<OutboundLine> {
    ParsedMessage::parse(line).ok().and_then(|msg| ping::respond(&msg))
}

fn spawn_route(tasks: &mut JoinSet<Result<Routed>>, router: &Arc<Router>, line: String) {
    let router = router.clone();
    tasks.spawn(async move { router.route(&line).await });
}

async fn quit(outbox: &Outbox) {
    info!("shutting down");
    if let Err(error) = outbox.quit(QUIT_MESSAGE).await {
        warn!(%error, "could not send QUIT");
    }
}

fn flatten_writer(finished: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    match finished {
        Ok(result) => result,
        Err(join) => Err(Error::Io(io::Error::other(join))),
    }
}

fn log_finished(done: std::result::Result<Result<Routed>, JoinError>) {
    match done {
        Ok(Ok(routed)) => trace!(?routed, "line handled"),
        Ok(Err(error)) => warn!(%error, "line not handled"),
        Err(join) if join.is_panic() => error!("router task panicked"),
        Err(join) => debug!(%join, "router task cancelled"),
    }
}
