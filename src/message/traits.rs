use smallvec::SmallVec;

use super::util;

pub trait Message {
    fn command(&self) -> &str;

    /// Case-insensitive comparison against a protocol verb.
    fn is(&self, verb: &str) -> bool {
        self.command().eq_ignore_ascii_case(verb)
    }
}

/// Access to the sender identity. Only `prefix` is required, the parts are
/// derived from it.
pub trait Prefixed {
    fn prefix(&self) -> Option<&str>;

    fn nick(&self) -> Option<&str> {
        self.prefix().map(|p| util::split_prefix(p).0)
    }

    fn user(&self) -> Option<&str> {
        self.prefix().and_then(|p| util::split_prefix(p).1)
    }

    fn host(&self) -> Option<&str> {
        self.prefix().and_then(|p| util::split_prefix(p).2)
    }
}

pub trait Parameterized {
    fn middle(&self) -> Option<&str>;
    fn trailing(&self) -> Option<&str>;

    /// First word of the middle field, usually a channel or a nickname.
    fn target(&self) -> Option<&str> {
        self.middle().and_then(|m| m.split_ascii_whitespace().next())
    }

    fn params(&self) -> SmallVec<[&str; 4]> {
        let mut params: SmallVec<[&str; 4]> = self
            .middle()
            .map(|m| m.split_ascii_whitespace().collect())
            .unwrap_or_default();
        params.extend(self.trailing());
        params
    }
}

pub trait IrcMessage: Message + Prefixed + Parameterized {}

impl<T> IrcMessage for T where T: Message + Prefixed + Parameterized {}
