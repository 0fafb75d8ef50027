use std::{io, result};

use thiserror::Error;

pub type Result<T, E = Error> = result::Result<T, E>;

/// Error types for winmap operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to memory-map {len} bytes at offset {offset} of {file}")]
    ResourceExhausted {
        file: String,
        offset: u64,
        len: u64,
        #[source]
        source: io::Error,
    },

    #[error("file identifier is a {actual}, not a {expected}")]
    WrongIdentifierKind {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("cursor is not in a valid state for this operation")]
    InvalidState,
}
