use std::{fmt, io, num::{ParseFloatError, ParseIntError}, str::Utf8Error};
use quick_xml::events::attributes::AttrError;

/// Broad category of a failure, so callers can tell a rejected API call from a
/// broken connection or an unreadable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The OSM API answered with a status other than 200.
    OsmApi { status: u16, body: String },
    /// The request never produced a response.
    Transport,
    Xml,
    Parse,
    Config,
    Io,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    pub fn osm_api(status: u16, body: impl Into<String>, message: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::OsmApi { status, body: body.into() },
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Parse, message)
    }

    /// HTTP status of a rejected API call, if that is what this error is.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::OsmApi { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::OsmApi { status, .. } => write!(f, "{} (HTTP {})", self.message, status),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::new(ErrorKind::Io, value.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Self {
        Error::new(ErrorKind::Xml, value.to_string())
    }
}

impl From<AttrError> for Error {
    fn from(value: AttrError) -> Self {
        Error::new(ErrorKind::Xml, value.to_string())
    }
}

impl From<ParseFloatError> for Error {
    fn from(value: ParseFloatError) -> Self {
        Error::parse(value.to_string())
    }
}

impl From<ParseIntError> for Error {
    fn from(value: ParseIntError) -> Self {
        Error::parse(value.to_string())
    }
}

impl From<Utf8Error> for Error {
    fn from(value: Utf8Error) -> Self {
        Error::parse(value.to_string())
    }
}

impl From<chrono::ParseError> for Error {
    fn from(value: chrono::ParseError) -> Self {
        Error::parse(value.to_string())
    }
}

impl From<ureq::Error> for Error {
    fn from(value: ureq::Error) -> Self {
        Error::new(ErrorKind::Transport, value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::new(ErrorKind::Config, value.to_string())
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::new(ErrorKind::Parse, value)
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::new(ErrorKind::Parse, value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osm_api_error_reports_status() {
        let err = Error::osm_api(409, "Changeset 5 was closed", "Unable to create node");
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "Unable to create node (HTTP 409)");
    }

    #[test]
    fn foreign_errors_keep_their_message() {
        let err: Error = "12a".parse::<u64>().unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.status(), None);
        assert!(!err.message.is_empty());
    }
}
