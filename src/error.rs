//! Error types shared by every host, archive format and path operation.

use std::io;

/// Boxed transport error carried as the `source` of connection and access
/// failures. Each backend's client crate has its own error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong between parsing a URL and reading bytes.
///
/// Errors propagate unchanged: archive layers do not wrap the failure of the
/// path they are backed by, and nothing is retried.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No host factory is registered for the URL scheme.
    #[error("scheme {scheme} is not known")]
    UnknownScheme { scheme: String },

    /// The URL could not be split into its components.
    #[error("malformed url {url:?}: {reason}")]
    MalformedUrl { url: String, reason: String },

    /// The transport could not be established (DNS, refused, handshake,
    /// rejected credentials).
    #[error("no connection to {host}")]
    NoHostConnection {
        host: String,
        #[source]
        source: BoxError,
    },

    /// A connection was required but is still absent after connecting.
    #[error("{host} is not connected")]
    NotConnected { host: String },

    /// The transport works but the resource is missing or denied.
    #[error("file not accessible: {path}")]
    FileNotAccessible {
        path: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A segment was required to name an archive but no format claims it.
    #[error("no archive format is registered for {segment:?}")]
    UnsupportedExtension { segment: String },

    /// The scheme is known but its backend was not compiled in.
    #[error("{scheme} support is not available; rebuild with the `{feature}` feature")]
    BackendUnavailable {
        scheme: &'static str,
        feature: &'static str,
    },

    /// The archive bytes do not form a valid container.
    #[error("malformed {format} archive: {reason}")]
    MalformedArchive { format: &'static str, reason: String },

    /// The segment list cannot be mapped onto the backend's namespace.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// The bytes at `path` are not valid UTF-8.
    #[error("{path} is not valid utf-8")]
    Utf8 {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn no_connection(host: impl ToString, source: impl Into<BoxError>) -> Self {
        Error::NoHostConnection {
            host: host.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn not_accessible(path: impl ToString) -> Self {
        Error::FileNotAccessible {
            path: path.to_string(),
            source: None,
        }
    }

    pub(crate) fn not_accessible_because(path: impl ToString, source: impl Into<BoxError>) -> Self {
        Error::FileNotAccessible {
            path: path.to_string(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn malformed_archive(format: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedArchive {
            format,
            reason: reason.into(),
        }
    }

    /// True for failures of the resource itself rather than the transport.
    pub fn is_not_accessible(&self) -> bool {
        matches!(self, Error::FileNotAccessible { .. })
    }

    /// True when the transport could not be established.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Error::NoHostConnection { .. } | Error::NotConnected { .. }
        )
    }
}
