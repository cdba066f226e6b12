use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::connection::Outbox;
use crate::dispatch::{CommandHandler, CommandRegistry, Invocation};

/// Lists the available commands. Also answers anything unknown.
pub struct Help {
    names: Vec<String>,
}

impl Help {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

#[async_trait]
impl CommandHandler for Help {
    async fn handle(&self, invocation: Invocation<'_>, outbox: &Outbox) -> anyhow::Result<()> {
        let text = format!("commands: {}", self.names.join(" "));
        outbox.privmsg(invocation.channel, &text).await?;
        Ok(())
    }
}

/// Replies with the crate name and version.
pub struct Version;

#[async_trait]
impl CommandHandler for Version {
    async fn handle(&self, invocation: Invocation<'_>, outbox: &Outbox) -> anyhow::Result<()> {
        let text = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));
        outbox.privmsg(invocation.channel, text).await?;
        Ok(())
    }
}

/// `help` and `version` under the configured prefix, `help` doubling as fallback.
pub fn builtin_registry(config: &Config) -> CommandRegistry {
    let prefix = config.bot.command_prefix;
    let help_name = format!("{}help", prefix);
    let version_name = format!("{}version", prefix);

    let help: Arc<dyn CommandHandler> =
        Arc::new(Help::new(vec![help_name.clone(), version_name.clone()]));

    CommandRegistry::new(help.clone())
        .register(help_name, help)
        .register(version_name, Arc::new(Version))
}
