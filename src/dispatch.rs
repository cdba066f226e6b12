use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::Outbox;

/// One in-band command, as seen by a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Command token including the prefix character, e.g. `.version`.
    pub command: &'a str,
    /// Everything after the command token, trimmed.
    pub args: &'a str,
    /// Where the line was sent to, usually a channel.
    pub channel: &'a str,
    /// Nickname of the sender, if the line had a prefix.
    pub sender: Option<&'a str>,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, invocation: Invocation<'_>, outbox: &Outbox) -> anyhow::Result<()>;
}

/// Split `.cmd  some args ` into `(".cmd", "some args")`.
///
/// Returns `None` unless the text starts with `prefix`.
pub fn split_command(text: &str, prefix: char) -> Option<(&str, &str)> {
    if !text.starts_with(prefix) {
        return None;
    }
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    let (command, rest) = text.split_at(end);
    Some((command, rest.trim()))
}

/// Maps command tokens to handlers, with a fallback for everything else.
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    fallback: Arc<dyn CommandHandler>,
}

impl CommandRegistry {
    pub fn new(fallback: Arc<dyn CommandHandler>) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback,
        }
    }

    /// Register `handler` under `name`, which includes the prefix character.
    pub fn register(mut self, name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Handler for `command`, or the fallback when nothing is registered.
    pub fn resolve(&self, command: &str) -> (&Arc<dyn CommandHandler>, bool) {
        match self.handlers.get(command) {
            Some(handler) => (handler, true),
            None => (&self.fallback, false),
        }
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn dispatch(&self, invocation: Invocation<'_>, outbox: &Outbox) -> anyhow::Result<()> {
        let (handler, _) = self.resolve(invocation.command);
        handler.handle(invocation, outbox).await
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish_non_exhaustive()
    }
}
