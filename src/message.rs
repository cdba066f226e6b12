use std::fmt::{Debug, Display, Formatter, Result as FResult};
use std::str::FromStr;

use crate::error::ParseError;

pub mod outbound;
pub mod traits;
pub mod util;

pub mod prelude {
    pub use super::outbound::OutboundLine;
    pub use super::traits::*;
    pub use super::ParsedMessage;
}

use traits::{Message, Parameterized, Prefixed};

/// Byte range `(begin, end)` into the raw line.
pub(crate) type Span = (u16, u16);

/// One inbound protocol line split into prefix, command, middle and trailing.
///
/// The message owns the raw line and only stores offsets into it, so the
/// accessors hand out borrowed slices.
#[derive(Clone)]
pub struct ParsedMessage {
    pub(crate) raw: String,
    pub(crate) prefix: Option<Span>,
    pub(crate) command: Span,
    pub(crate) middle: Option<Span>,
    pub(crate) trailing: Option<Span>,
}

impl ParsedMessage {
    pub(crate) fn new(
        raw: String,
        prefix: Option<Span>,
        command: Span,
        middle: Option<Span>,
        trailing: Option<Span>,
    ) -> Self {
        debug_assert!(raw.len() <= u16::MAX as usize);
        Self {
            raw,
            prefix,
            command,
            middle,
            trailing,
        }
    }

    /// Parse a single line without its CR/LF terminator.
    ///
    /// ```
    /// use tiny_ircbot::message::prelude::*;
    ///
    /// let msg = ParsedMessage::parse(":nick!user@host PRIVMSG #chan :hello there").unwrap();
    /// assert_eq!(msg.command(), "PRIVMSG");
    /// assert_eq!(msg.nick(), Some("nick"));
    /// assert_eq!(msg.trailing(), Some("hello there"));
    /// ```
    pub fn parse(raw: impl Into<String>) -> Result<Self, ParseError> {
        crate::parser::parse(raw.into())
    }

    /// The line exactly as it was received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[inline(always)]
    fn slice(&self, (begin, end): Span) -> &str {
        debug_assert!(begin <= end);
        &self.raw[begin as usize..end as usize]
    }
}

impl Message for ParsedMessage {
    fn command(&self) -> &str {
        self.slice(self.command)
    }
}

impl Prefixed for ParsedMessage {
    fn prefix(&self) -> Option<&str> {
        self.prefix.map(|p| self.slice(p))
    }
}

impl Parameterized for ParsedMessage {
    fn middle(&self) -> Option<&str> {
        self.middle.map(|p| self.slice(p))
    }

    fn trailing(&self) -> Option<&str> {
        self.trailing.map(|p| self.slice(p))
    }
}

impl FromStr for ParsedMessage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for ParsedMessage {
    fn eq(&self, other: &Self) -> bool {
        self.prefix() == other.prefix()
            && self.command() == other.command()
            && self.middle() == other.middle()
            && self.trailing() == other.trailing()
    }
}

impl Eq for ParsedMessage {}

/// Rebuilds the wire form from the parsed fields, without the terminator.
impl Display for ParsedMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        if let Some(prefix) = self.prefix() {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command())?;
        if let Some(middle) = self.middle() {
            write!(f, " {}", middle)?;
        }
        if let Some(trailing) = self.trailing() {
            write!(f, " :{}", trailing)?;
        }
        Ok(())
    }
}

impl Debug for ParsedMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        let mut debug_struct = f.debug_struct("Message");

        if let Some(prefix) = self.prefix() {
            debug_struct.field("prefix", &prefix);
        }

        debug_struct.field("command", &self.command());

        if let Some(middle) = self.middle() {
            debug_struct.field("middle", &middle);
        }

        if let Some(trailing) = self.trailing() {
            debug_struct.field("trailing", &trailing);
        }

        debug_struct.finish()
    }
}
