use memchr::memchr2;

use crate::error::ParseError;
use crate::message::{ParsedMessage, Span};

/// Spans are stored as `u16`, longer lines are rejected.
pub const MAX_LINE_LEN: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy)]
enum State {
    Start,
    Prefix { begin: u16 },
    AfterPrefix,
    Command { begin: u16 },
    Params,
    Middle { begin: u16 },
    MiddleSpace { begin: u16, end: u16 },
    Trailing { begin: u16 },
}

/// Split one line (terminator already removed) into its four fields.
///
/// `[':' prefix SP] command [SP middle] [SP ':' trailing]`
///
/// Runs of spaces between fields are accepted. The middle field ends at the
/// first space followed by `:`; everything after that marker is the trailing
/// field, colons and spaces included.
pub fn parse(raw: String) -> Result<ParsedMessage, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::Empty);
    }
    if raw.len() > MAX_LINE_LEN {
        return Err(ParseError::TooLong(raw.len()));
    }
    if memchr2(b'\r', b'\n', raw.as_bytes()).is_some() {
        return Err(ParseError::EmbeddedTerminator);
    }

    let mut prefix: Option<Span> = None;
    let mut command: Option<Span> = None;
    let mut middle: Option<Span> = None;
    let mut trailing: Option<Span> = None;

    let mut state = State::Start;

    for (i, b) in raw.bytes().enumerate() {
        let i = i as u16;
        state = match state {
            State::Start => match b {
                b':' => State::Prefix { begin: i + 1 },
                b' ' => return Err(ParseError::LeadingWhitespace),
                _ => State::Command { begin: i },
            },
            State::Prefix { begin } => match b {
                b' ' if i == begin => return Err(ParseError::EmptyPrefix),
                b' ' => {
                    prefix = Some((begin, i));
                    State::AfterPrefix
                }
                _ => state,
            },
            State::AfterPrefix => match b {
                b' ' => state,
                _ => State::Command { begin: i },
            },
            State::Command { begin } => match b {
                b' ' => {
                    command = Some((begin, i));
                    State::Params
                }
                _ => state,
            },
            State::Params => match b {
                b' ' => state,
                b':' => State::Trailing { begin: i + 1 },
                _ => State::Middle { begin: i },
            },
            State::Middle { begin } => match b {
                b' ' => State::MiddleSpace { begin, end: i },
                _ => state,
            },
            State::MiddleSpace { begin, end } => match b {
                b' ' => state,
                b':' => {
                    middle = Some((begin, end));
                    State::Trailing { begin: i + 1 }
                }
                _ => State::Middle { begin },
            },
            // the rest of the line belongs to the trailing field
            State::Trailing { .. } => break,
        };
    }

    let end = raw.len() as u16;
    match state {
        State::Start => return Err(ParseError::Empty),
        State::Prefix { begin } if begin == end => return Err(ParseError::EmptyPrefix),
        State::Prefix { .. } | State::AfterPrefix => return Err(ParseError::MissingCommand),
        State::Command { begin } => command = Some((begin, end)),
        State::Params => {}
        State::Middle { begin } => middle = Some((begin, end)),
        State::MiddleSpace { begin, end } => middle = Some((begin, end)),
        State::Trailing { begin } => trailing = Some((begin, end)),
    }

    let command = command.ok_or(ParseError::MissingCommand)?;
    Ok(ParsedMessage::new(raw, prefix, command, middle, trailing))
}
