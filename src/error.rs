/*!
error module defines the error types used in ribrecon.
*/
use std::fmt::{Display, Formatter};
use std::{fmt, io};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Unknown collector, unparseable date range, missing required option.
    /// Fatal before any I/O.
    Config(String),
    /// Non-2xx response, or any other failure to retrieve a URL. Fatal.
    Download { url: String, reason: String },
    /// Failure to launch or read from the external MRT decoder process.
    /// Fatal for the file it was decoding.
    Decoder { path: String, reason: String },
    /// A decoded record did not match the `|`-delimited record contract.
    MalformedRecord(String),
    Io(io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}

impl std::error::Error for Error {}

/// implement Display trait for Error which satisfies the std::error::Error
/// trait's requirement (must implement Display and Debug traits, Debug already derived)
impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(s) => write!(f, "configuration error: {s}"),
            Error::Download { url, reason } => write!(f, "download error for {url}: {reason}"),
            Error::Decoder { path, reason } => write!(f, "decoder error for {path}: {reason}"),
            Error::MalformedRecord(s) => write!(f, "malformed record: {s}"),
            Error::Io(e) => write!(f, "Error: {e}"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Self {
        Error::Io(io_error)
    }
}

impl From<csv::Error> for Error {
    fn from(csv_error: csv::Error) -> Self {
        Error::Config(format!("csv error: {csv_error}"))
    }
}
