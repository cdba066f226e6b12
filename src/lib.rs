//! A small IRC bot: a line parser, a router that answers pings, grants a
//! mode to a trusted nick, runs dot-commands and greets people, and the tokio
//! plumbing around it.

pub mod bot;
pub mod commands;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod parser;
pub mod ping;
pub mod reader;
pub mod router;

pub use bot::Bot;
pub use config::Config;
pub use connection::{Connection, Outbox};
pub use dispatch::{CommandHandler, CommandRegistry, Invocation};
pub use error::{Error, ParseError, Result};
pub use message::ParsedMessage;
pub use router::{ChatterHook, Routed, Router};
