use memchr::{memchr, memchr2};

/// Split a sender prefix into `(nick, user, host)`.
///
/// The nickname is everything before the first `!`, or the whole prefix for
/// server names. User and host are only reported for `nick!user@host` forms.
pub fn split_prefix(prefix: &str) -> (&str, Option<&str>, Option<&str>) {
    let Some(bang) = memchr(b'!', prefix.as_bytes()) else {
        return (prefix, None, None);
    };
    let nick = &prefix[..bang];
    let rest = &prefix[bang + 1..];

    match memchr(b'@', rest.as_bytes()) {
        Some(at) => (nick, Some(&rest[..at]), Some(&rest[at + 1..])),
        None => (nick, Some(rest), None),
    }
}

/// Drop a trailing `\n`, `\r\n` or `\r`.
#[inline]
pub fn strip_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

/// Cut text at the first CR or LF so it can be placed on a single line.
#[inline]
pub fn single_line(text: &str) -> &str {
    match memchr2(b'\r', b'\n', text.as_bytes()) {
        Some(i) => &text[..i],
        None => text,
    }
}

/// Render a final parameter, adding the trailing marker only when needed.
pub fn last_param(param: &str) -> String {
    if param.is_empty() || param.starts_with(':') || param.contains(' ') {
        format!(":{}", param)
    } else {
        param.to_string()
    }
}
