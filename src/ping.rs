use crate::message::prelude::*;

pub const PROBE: &str = "PING";

/// The `PONG` answering `msg`, if `msg` is a keep-alive probe.
///
/// The payload is echoed verbatim: the trailing field when there is one,
/// otherwise the middle field.
pub fn respond(msg: &ParsedMessage) -> Option<OutboundLine> {
    if msg.command() != PROBE {
        return None;
    }
    let payload = msg.trailing().or(msg.middle()).unwrap_or_default();
    Some(OutboundLine::pong(payload))
}
