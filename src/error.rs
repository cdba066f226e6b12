use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a raw line could not be turned into a [`ParsedMessage`](crate::message::ParsedMessage).
///
/// Parse failures are per line and never fatal: the router drops the line and
/// keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("line starts with whitespace")]
    LeadingWhitespace,
    #[error("prefix marker without a prefix")]
    EmptyPrefix,
    #[error("no command token")]
    MissingCommand,
    #[error("line contains an embedded CR or LF")]
    EmbeddedTerminator,
    #[error("line is {0} bytes long")]
    TooLong(usize),
}

/// Errors raised while loading or validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Connection level failures. These end the session.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error on the server connection")]
    Io(#[from] io::Error),
    #[error("connection closed")]
    ConnectionClosed,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
