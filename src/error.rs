use thiserror::Error;

/// Errors raised while decoding a raw typing log.
///
/// Degenerate arithmetic (zero elapsed time, zero characters) is never an
/// error; speed computations report those as `f64::INFINITY` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// The log string was empty after unescaping.
    #[error("empty typing log")]
    Empty,

    /// A textual escape sequence could not be decoded.
    #[error("invalid escape sequence at byte {position}")]
    BadEscape { position: usize },

    /// A keystroke token ended before its payload character.
    #[error("truncated keystroke token at byte {position}")]
    TruncatedToken { position: usize },

    /// A delete or replace targeted a position outside the typed buffer.
    #[error("keystroke {keystroke} edits position {position} of a {buffer_len}-character buffer")]
    EditOutOfBounds {
        keystroke: usize,
        position: usize,
        buffer_len: usize,
    },

    /// Replaying every keystroke did not reproduce the quote carried in the
    /// delay half of the log.
    #[error("replayed text does not match the quote ({replayed:?} != {quote:?})")]
    ReplayMismatch { replayed: String, quote: String },
}
