use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::connection::Outbox;
use crate::dispatch::{split_command, CommandRegistry, Invocation};
use crate::error::Result;
use crate::message::prelude::*;
use crate::ping;

/// Receives plain chat that nothing else claimed.
#[async_trait]
pub trait ChatterHook: Send + Sync {
    async fn on_chatter(&self, message: &str, channel: &str, outbox: &Outbox) -> anyhow::Result<()>;
}

/// Ignores all chatter.
pub struct Silent;

#[async_trait]
impl ChatterHook for Silent {
    async fn on_chatter(&self, _message: &str, _channel: &str, _outbox: &Outbox) -> anyhow::Result<()> {
        Ok(())
    }
}

/// What the router did with a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Not a protocol line.
    Dropped,
    Pong,
    /// Trusted nickname joined and got its mode.
    Granted,
    /// An in-band command ran, `known` is false when the fallback took it.
    Command { name: String, known: bool },
    Greeted,
    Chatter,
}

/// Decides, per inbound line, which single reaction applies.
///
/// The router only reads its configuration; every line is handled on its
/// own and several lines may be routed at the same time.
pub struct Router {
    config: Arc<Config>,
    registry: CommandRegistry,
    chatter: Arc<dyn ChatterHook>,
    outbox: Outbox,
    greeting_trigger: String,
}

impl Router {
    pub fn new(config: Arc<Config>, registry: CommandRegistry, outbox: Outbox) -> Self {
        let greeting_trigger = format!("hi {}", config.bot.nickname);
        Self {
            config,
            registry,
            chatter: Arc::new(Silent),
            outbox,
            greeting_trigger,
        }
    }

    pub fn with_chatter(mut self, chatter: Arc<dyn ChatterHook>) -> Self {
        self.chatter = chatter;
        self
    }

    /// Handle one raw line.
    ///
    /// Only a failure to queue output is returned as an error: it means the
    /// connection is gone. Handler failures are logged and reported.
    pub async fn route(&self, line: &str) -> Result<Routed> {
        let msg = match ParsedMessage::parse(line) {
            Ok(msg) => msg,
            Err(error) => {
                trace!(%error, line, "dropping unparsable line");
                return Ok(Routed::Dropped);
            }
        };

        if let Some(pong) = ping::respond(&msg) {
            self.outbox.send(pong).await?;
            return Ok(Routed::Pong);
        }

        let nick = msg.nick().unwrap_or_default();

        if msg.is("JOIN") && self.is_trusted(nick) {
            if let Some(channel) = msg.target().or(msg.trailing()) {
                info!(nick, channel, mode = %self.config.bot.grant_mode, "granting mode to trusted nick");
                self.outbox
                    .send(OutboundLine::mode(channel, &self.config.bot.grant_mode, nick))
                    .await?;
                return Ok(Routed::Granted);
            }
        }

        let channel = msg.middle().unwrap_or_default();
        let trailing = msg.trailing().unwrap_or_default();

        if let Some((command, args)) = split_command(trailing, self.config.bot.command_prefix) {
            return self.run_command(&msg, command, args, channel).await;
        }

        if trailing.contains(&self.greeting_trigger) {
            // no channel means a private line, answer the sender
            let target = if channel.is_empty() { nick } else { channel };
            debug!(nick, target, "greeting");
            self.outbox
                .privmsg(target, &format!("Hi there {}", nick))
                .await?;
            return Ok(Routed::Greeted);
        }

        if let Err(error) = self.chatter.on_chatter(trailing, channel, &self.outbox).await {
            warn!(channel, error = %error, "chatter hook failed");
        }
        Ok(Routed::Chatter)
    }

    async fn run_command(
        &self,
        msg: &ParsedMessage,
        command: &str,
        args: &str,
        channel: &str,
    ) -> Result<Routed> {
        let (_, known) = self.registry.resolve(command);
        debug!(command, args, channel, known, "dispatching command");

        let invocation = Invocation {
            command,
            args,
            channel,
            sender: msg.nick(),
        };

        if let Err(error) = self.registry.dispatch(invocation, &self.outbox).await {
            warn!(command, channel, error = %format!("{:#}", error), "command failed");
            if self.config.bot.report_failures && !channel.is_empty() {
                self.outbox
                    .privmsg(channel, &format!("{}: {}", command, error))
                    .await?;
            }
        }

        Ok(Routed::Command {
            name: command.to_string(),
            known,
        })
    }

    fn is_trusted(&self, nick: &str) -> bool {
        !nick.is_empty() && self.config.bot.trusted_identity.as_deref() == Some(nick)
    }
}
