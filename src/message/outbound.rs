use std::fmt::{Display, Formatter, Result as FResult};

use super::util::{last_param, single_line};

/// A line queued for the server, stored without its CRLF terminator.
///
/// Every constructor cuts its inputs at the first CR or LF, so text coming
/// from chat or from a handler cannot smuggle in a second protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundLine(String);

impl OutboundLine {
    pub fn raw(line: &str) -> Self {
        Self(single_line(line).to_string())
    }

    /// Keep-alive answer echoing the probe payload.
    pub fn pong(payload: &str) -> Self {
        Self(format!("PONG {}", last_param(single_line(payload))))
    }

    /// Chat message. Returns `None` when there is nothing to say.
    pub fn privmsg(target: &str, text: &str) -> Option<Self> {
        let text = single_line(text);
        if text.is_empty() {
            return None;
        }
        Some(Self(format!("PRIVMSG {} :{}", single_line(target), text)))
    }

    pub fn mode(channel: &str, modes: &str, nick: &str) -> Self {
        Self(format!(
            "MODE {} {} {}",
            single_line(channel),
            single_line(modes),
            single_line(nick)
        ))
    }

    pub fn pass(password: &str) -> Self {
        Self(format!("PASS {}", single_line(password)))
    }

    pub fn user(username: &str, realname: &str) -> Self {
        Self(format!(
            "USER {} 8 * :{}",
            single_line(username),
            single_line(realname)
        ))
    }

    pub fn nick(nickname: &str) -> Self {
        Self(format!("NICK {}", single_line(nickname)))
    }

    pub fn join(channel: &str) -> Self {
        Self(format!("JOIN {}", single_line(channel)))
    }

    pub fn quit(reason: &str) -> Self {
        Self(format!("QUIT :{}", single_line(reason)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OutboundLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        f.write_str(&self.0)
    }
}
