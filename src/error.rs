use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum PortalError {
    String(String),
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl Error for PortalError {}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PortalError::String(msg) => write!(f, "{msg}"),
            PortalError::Io(e) => write!(f, "I/O error: {e}"),
            PortalError::Serde(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl From<String> for PortalError {
    fn from(err: String) -> Self {
        PortalError::String(err)
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::Io(err)
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Serde(err)
    }
}
