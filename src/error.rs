use std;
use std::fmt::{self, Display};

pub type Result<T> = std::result::Result<T, Error>;

/// XFS binary and JSON projection error.
#[derive(Debug)]
pub enum Error {
    /// Wraps an underlying I/O failure reading or writing a file.
    Io(std::io::Error),
    /// The 4-byte file magic did not match `XFS\0`.
    InvalidMagic,
    /// `major_version` is not one of the schema layouts this crate implements.
    UnsupportedVersion(u16),
    /// The schema block's offset table points outside the block, or `def_size`
    /// is too small to hold `def_count` offset-table entries.
    SchemaOverflow(String),
    /// A value or string read ran past the end of the input, or past the
    /// recorded size of the enclosing object.
    TruncatedValue(String),
    /// A type tag present on disk (or in JSON) is reserved or unknown and the
    /// codec refuses to read or write a value of that type.
    UnsupportedType(u32),
    /// A JSON node was missing a required key or had the wrong shape.
    JsonShape(String),
    /// An internal allocation or capacity invariant was violated (e.g. a
    /// `CUSTOM` value with more than 255 entries).
    Allocation,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(formatter, "i/o error: {}", err),
            Error::InvalidMagic => formatter.write_str("not an XFS file (bad magic)"),
            Error::UnsupportedVersion(v) => write!(formatter, "unsupported major_version {}", v),
            Error::SchemaOverflow(msg) => write!(formatter, "schema block overflow: {}", msg),
            Error::TruncatedValue(msg) => write!(formatter, "truncated value: {}", msg),
            Error::UnsupportedType(t) => write!(formatter, "unsupported or reserved type tag 0x{:02X}", t),
            Error::JsonShape(msg) => write!(formatter, "malformed JSON: {}", msg),
            Error::Allocation => formatter.write_str("allocation or capacity invariant violated"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}
