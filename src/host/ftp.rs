use std::fmt;
use std::io::Cursor;

use super::{Host, HostExt, Lazy};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::stream::ByteStream;
use crate::url::{Credentials, Url};

/// An FTP server, optionally with explicit TLS (`ftps`).
///
/// The control connection is opened and logged in on first use and kept
/// until the host is dropped, which sends `QUIT`. Without credentials the
/// login is anonymous.
pub struct FtpHost {
    secure: bool,
    hostname: String,
    port: u16,
    credentials: Option<Credentials>,
    connection: Lazy<client::Connection>,
}

impl FtpHost {
    pub const DEFAULT_PORT: u16 = 21;

    fn new(secure: bool, hostname: impl Into<String>) -> Self {
        let host = Self {
            secure,
            hostname: hostname.into(),
            port: Self::DEFAULT_PORT,
            credentials: None,
            connection: Lazy::new(),
        };
        if let Err(e) = client::available(secure) {
            tracing::warn!(host = %host, "{e}");
        }
        host
    }

    pub fn ftp(hostname: impl Into<String>) -> Self {
        Self::new(false, hostname)
    }

    pub fn ftps(hostname: impl Into<String>) -> Self {
        Self::new(true, hostname)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Login pair, anonymous when no credentials are set.
    fn login(&self) -> (&str, &str) {
        match &self.credentials {
            Some(credentials) => (credentials.username.as_str(), credentials.password()),
            None => ("anonymous", "anonymous@"),
        }
    }
}

impl fmt::Display for FtpHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.secure { "FtpsHost" } else { "FtpHost" };
        write!(f, "{label}({}:{})", self.hostname, self.port)
    }
}

impl Host for FtpHost {
    fn scheme(&self) -> &str {
        if self.secure { "ftps" } else { "ftp" }
    }

    fn identity(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    fn open(&self, segments: &[String]) -> Result<ByteStream> {
        client::available(self.secure)?;
        let (file, dirs) = segments.split_last().ok_or_else(|| Error::InvalidPath {
            path: self.to_string(),
            reason: "an FTP path must name a file",
        })?;
        let location = format!("{self}/{}", segments.join("/"));

        let data = self.connection.with(
            self,
            || client::connect(self),
            |connection| connection.retrieve(&location, dirs, file),
        )?;
        Ok(Box::new(Cursor::new(data)))
    }
}

pub(crate) fn from_url(url: &Url, _settings: &Settings) -> Result<Path> {
    let mut host = if url.scheme == "ftps" {
        FtpHost::ftps(&url.hostname)
    } else {
        FtpHost::ftp(&url.hostname)
    };
    if let Some(port) = url.port {
        host = host.with_port(port);
    }
    if let Some(credentials) = &url.credentials {
        host = host.with_credentials(credentials.clone());
    }
    Ok(host.join(&url.path))
}

#[cfg(feature = "ftp")]
mod client {
    use suppaftp::FtpStream;
    #[cfg(feature = "ftps")]
    use suppaftp::{RustlsConnector, RustlsFtpStream};

    use super::FtpHost;
    use crate::error::{Error, Result};

    enum Stream {
        Plain(FtpStream),
        #[cfg(feature = "ftps")]
        Secure(RustlsFtpStream),
    }

    /// Run the same code against either stream type.
    macro_rules! with_stream {
        ($stream:expr, $s:ident => $body:expr) => {
            match $stream {
                Stream::Plain($s) => $body,
                #[cfg(feature = "ftps")]
                Stream::Secure($s) => $body,
            }
        };
    }

    /// A logged-in control connection and its login directory.
    pub(super) struct Connection {
        stream: Stream,
        home: String,
    }

    pub(super) fn available(secure: bool) -> Result<()> {
        if secure && !cfg!(feature = "ftps") {
            return Err(Error::BackendUnavailable {
                scheme: "ftps",
                feature: "ftps",
            });
        }
        Ok(())
    }

    pub(super) fn connect(host: &FtpHost) -> Result<Connection> {
        let address = (host.hostname.as_str(), host.port);
        let mut stream = if host.secure {
            secure_stream(host, address)?
        } else {
            Stream::Plain(FtpStream::connect(address).map_err(|e| Error::no_connection(host, e))?)
        };

        let (user, password) = host.login();
        let home = with_stream!(&mut stream, s => {
            s.login(user, password).map_err(|e| Error::no_connection(host, e))?;
            s.pwd().map_err(|e| Error::no_connection(host, e))?
        });
        tracing::debug!(host = %host, user, "logged in");

        Ok(Connection { stream, home })
    }

    #[cfg(feature = "ftps")]
    fn secure_stream(host: &FtpHost, address: (&str, u16)) -> Result<Stream> {
        use std::sync::Arc;

        let roots = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        let stream = RustlsFtpStream::connect(address)
            .map_err(|e| Error::no_connection(host, e))?
            .into_secure(RustlsConnector::from(Arc::new(config)), &host.hostname)
            .map_err(|e| Error::no_connection(host, e))?;
        Ok(Stream::Secure(stream))
    }

    #[cfg(not(feature = "ftps"))]
    fn secure_stream(_host: &FtpHost, _address: (&str, u16)) -> Result<Stream> {
        Err(Error::BackendUnavailable {
            scheme: "ftps",
            feature: "ftps",
        })
    }

    impl Connection {
        /// `RETR file` after changing to `dirs` below the login directory.
        pub(super) fn retrieve(
            &mut self,
            location: &str,
            dirs: &[String],
            file: &str,
        ) -> Result<Vec<u8>> {
            let home = self.home.as_str();
            with_stream!(&mut self.stream, s => {
                s.cwd(home).map_err(|e| Error::not_accessible_because(location, e))?;
                if !dirs.is_empty() {
                    s.cwd(dirs.join("/")).map_err(|e| Error::not_accessible_because(location, e))?;
                }
                let data = s
                    .retr_as_buffer(file)
                    .map_err(|e| Error::not_accessible_because(location, e))?;
                Ok(data.into_inner())
            })
        }
    }

    impl Drop for Connection {
        fn drop(&mut self) {
            let _ = with_stream!(&mut self.stream, s => s.quit());
        }
    }
}

#[cfg(not(feature = "ftp"))]
mod client {
    use super::FtpHost;
    use crate::error::{Error, Result};

    pub(super) enum Connection {}

    fn unavailable(secure: bool) -> Error {
        let name = if secure { "ftps" } else { "ftp" };
        Error::BackendUnavailable {
            scheme: name,
            feature: name,
        }
    }

    pub(super) fn available(secure: bool) -> Result<()> {
        Err(unavailable(secure))
    }

    pub(super) fn connect(host: &FtpHost) -> Result<Connection> {
        Err(unavailable(host.secure))
    }

    impl Connection {
        pub(super) fn retrieve(
            &mut self,
            _location: &str,
            _dirs: &[String],
            _file: &str,
        ) -> Result<Vec<u8>> {
            match *self {}
        }
    }
}
