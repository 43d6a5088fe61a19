//! Hosts: connectable origins that turn a segment list into bytes.
//!
//! Every backend implements [`Host`]. A host owns the parameters that
//! identify its endpoint, optional credentials, and a lazily created
//! connection ([`Lazy`]) that the first `open` establishes and later opens
//! reuse. Backends whose client crate is not compiled in are still present;
//! their `open` fails with [`Error::BackendUnavailable`].

mod ftp;
mod hdfs;
mod http;
mod local;
mod package;
mod s3;
mod sftp;
mod smb;

pub use ftp::FtpHost;
pub use hdfs::HdfsHost;
pub use http::{HttpHost, HttpScheme};
pub use local::LocalHost;
pub use package::PackageHost;
pub use s3::S3Host;
pub use sftp::SftpHost;
pub use smb::SmbHost;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::path::Path;
use crate::registry::SchemeRegistry;
use crate::stream::ByteStream;

/// A connectable origin.
///
/// Two hosts are equal when their schemes and [`Host::identity`] match.
/// Credentials are never part of the identity.
pub trait Host: fmt::Display + Send + Sync {
    /// URL scheme this host serves.
    fn scheme(&self) -> &str;

    /// Connection-identifying parameters, e.g. `example.com:443`.
    fn identity(&self) -> String;

    /// Fetch the resource at `segments`, connecting first if needed.
    ///
    /// Fails with [`Error::NoHostConnection`] when the transport cannot be
    /// established and [`Error::FileNotAccessible`] when the resource is
    /// missing or denied.
    fn open(&self, segments: &[String]) -> Result<ByteStream>;
}

impl fmt::Debug for dyn Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Path construction directly on a host value.
pub trait HostExt: Host + Sized + 'static {
    /// The path with no segments on this host.
    fn root_path(self) -> Path {
        Path::from_host(Arc::new(self))
    }

    /// Shorthand for `self.root_path().join(segment)`.
    fn join(self, segment: &str) -> Path {
        self.root_path().join(segment)
    }
}

impl<H: Host + 'static> HostExt for H {}

/// A connection created on first use and kept for the host's lifetime.
///
/// The slot sits behind a mutex, so one host may be shared between threads;
/// operations on the same host are serialized.
pub(crate) struct Lazy<C> {
    slot: Mutex<Option<C>>,
}

impl<C> Lazy<C> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Run `f` on the connection, calling `connect` first if there is none.
    ///
    /// A failed `connect` leaves the slot empty so the next call tries again.
    pub(crate) fn with<T>(
        &self,
        host: &dyn Host,
        connect: impl FnOnce() -> Result<C>,
        f: impl FnOnce(&mut C) -> Result<T>,
    ) -> Result<T> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            tracing::debug!(host = %host, "connecting");
            *slot = Some(connect()?);
        }
        let connection = slot.as_mut().ok_or_else(|| Error::NotConnected {
            host: host.to_string(),
        })?;
        f(connection)
    }

    #[cfg(test)]
    pub(crate) fn is_connected(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Register every built-in scheme.
pub(crate) fn register_builtin(registry: &mut SchemeRegistry) {
    registry.register("file", local::from_url);
    registry.register("http", http::from_url);
    registry.register("https", http::from_url);
    registry.register("ftp", ftp::from_url);
    registry.register("ftps", ftp::from_url);
    registry.register("sftp", sftp::from_url);
    registry.register("smb", smb::from_url);
    registry.register("s3", s3::from_url);
    registry.register("hdfs", hdfs::from_url);
    registry.register("package", package::from_url);
}
