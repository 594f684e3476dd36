use std::{fmt, io};

/// Errors raised by the message write path.
///
/// The read path never surfaces errors: malformed input decodes to empty names or sentinel
/// values and parsing continues with the next record, because real mDNS traffic contains
/// malformed and legacy frames.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum Error {
    /// There was not enough space in the provided buffer to fit the entire message.
    ///
    /// No partial packet is emitted; the operation that was building the message fails
    /// wholesale.
    Truncated,
    /// A domain name label exceeded the 63-octet limit.
    LabelTooLong,
    /// An encoded domain name exceeded the 255-octet limit.
    NameTooLong,
}

impl Error {
    fn description(&self) -> &str {
        match self {
            Error::Truncated => "message does not fit in buffer",
            Error::LabelTooLong => "label too long",
            Error::NameTooLong => "encoded name too long",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl std::error::Error for Error {}

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        match e {
            Error::Truncated => io::ErrorKind::OutOfMemory.into(),
            Error::LabelTooLong => io::Error::new(
                io::ErrorKind::InvalidInput,
                "domain name label exceeds maximum label length",
            ),
            Error::NameTooLong => io::Error::new(
                io::ErrorKind::InvalidInput,
                "encoded domain name exceeds maximum name length",
            ),
        }
    }
}
