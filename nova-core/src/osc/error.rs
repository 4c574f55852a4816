use std::fmt;

/// Result type for wire parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Why a packet, bundle element or argument could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Element length is zero or not a multiple of 4.
    InvalidSize(usize),
    /// Bundles nested past the supported depth.
    NestingTooDeep { limit: usize },
    /// A bundle element claims more bytes than remain.
    ElementOverrun { claimed: usize, remaining: usize },
    /// Starts with `#` but is not `#bundle`.
    UnknownBundleMarker,
    /// String runs to the end of the buffer without a terminating null.
    UnterminatedString,
    InvalidUtf8,
    /// Bytes follow the address but do not start with `,`.
    MissingTypeTags,
    UnknownTypeTag(char),
    /// Argument data ends before the type tags say it should.
    Truncated { tag: char },
    /// String dispatch requires a leading `/`.
    BadAddress(String),
    MissingArgument { index: usize },
    WrongArgumentType { index: usize, expected: char, found: char },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize(n) => write!(f, "invalid element size {}", n),
            Self::ElementOverrun { claimed, remaining } => write!(
                f,
                "bundle element claims {} bytes, only {} remain",
                claimed, remaining
            ),
            Self::NestingTooDeep { limit } => write!(f, "bundle nesting deeper than {}", limit),
            Self::UnknownBundleMarker => write!(f, "unknown bundle marker"),
            Self::UnterminatedString => write!(f, "unterminated string"),
            Self::InvalidUtf8 => write!(f, "string is not valid UTF-8"),
            Self::MissingTypeTags => write!(f, "type tags not present"),
            Self::UnknownTypeTag(c) => write!(f, "unknown type tag '{}'", c.escape_default()),
            Self::Truncated { tag } => write!(f, "truncated argument of type '{}'", tag),
            Self::BadAddress(a) => write!(f, "address '{}' does not start with '/'", a),
            Self::MissingArgument { index } => write!(f, "missing argument {}", index),
            Self::WrongArgumentType {
                index,
                expected,
                found,
            } => write!(
                f,
                "argument {} has type '{}', expected '{}'",
                index, found, expected
            ),
        }
    }
}

impl std::error::Error for ParseError {}
