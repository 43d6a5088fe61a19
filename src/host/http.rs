use std::fmt;
use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::blocking::Client;
use reqwest::StatusCode;

use super::{Host, HostExt, Lazy};
use crate::config::{HttpSettings, Settings};
use crate::error::{Error, Result};
use crate::path::Path;
use crate::stream::ByteStream;
use crate::url::{Credentials, Url};

/// Characters escaped inside one path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpScheme {
    Http,
    Https,
}

impl HttpScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpScheme::Http => "http",
            HttpScheme::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            HttpScheme::Http => 80,
            HttpScheme::Https => 443,
        }
    }
}

/// A web server reached with plain `GET` requests.
///
/// The client is built on the first open and reused; responses are streamed
/// to the caller without buffering.
pub struct HttpHost {
    scheme: HttpScheme,
    hostname: String,
    port: u16,
    credentials: Option<Credentials>,
    verify_tls: bool,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    client: Lazy<Client>,
}

impl HttpHost {
    pub fn new(scheme: HttpScheme, hostname: impl Into<String>) -> Self {
        Self {
            scheme,
            hostname: hostname.into(),
            port: scheme.default_port(),
            credentials: None,
            verify_tls: true,
            timeout: None,
            user_agent: None,
            client: Lazy::new(),
        }
    }

    pub fn http(hostname: impl Into<String>) -> Self {
        Self::new(HttpScheme::Http, hostname)
    }

    pub fn https(hostname: impl Into<String>) -> Self {
        Self::new(HttpScheme::Https, hostname)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sent as HTTP basic auth.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub(crate) fn with_settings(self, settings: &HttpSettings) -> Self {
        let host = self
            .with_verify_tls(settings.verify_tls)
            .with_timeout(settings.timeout_secs.map(Duration::from_secs));
        match &settings.user_agent {
            Some(agent) => host.with_user_agent(agent),
            None => host,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Request URL for `segments`.
    pub fn url_for(&self, segments: &[String]) -> String {
        format!("{}/{}", self.base_url(), encode_path(segments))
    }

    pub(crate) fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme.as_str(), self.hostname, self.port)
    }

    fn connect(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(!self.verify_tls)
            .timeout(self.timeout);
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build().map_err(|e| Error::no_connection(self, e))
    }

    /// `GET url`, streaming the body of a `200 OK` response.
    pub(crate) fn fetch(&self, url: &str) -> Result<ByteStream> {
        let client = self.client.with(self, || self.connect(), |client| Ok(client.clone()))?;

        let mut request = client.get(url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_ref());
        }

        tracing::debug!(url = %url, "GET");
        let response = request.send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                Error::no_connection(self, e)
            } else {
                Error::not_accessible_because(url, e)
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::not_accessible_because(url, format!("HTTP {status}")));
        }
        Ok(Box::new(response))
    }
}

impl fmt::Display for HttpHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.scheme {
            HttpScheme::Http => "HttpHost",
            HttpScheme::Https => "HttpsHost",
        };
        write!(f, "{label}({}:{})", self.hostname, self.port)
    }
}

impl Host for HttpHost {
    fn scheme(&self) -> &str {
        self.scheme.as_str()
    }

    fn identity(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    fn open(&self, segments: &[String]) -> Result<ByteStream> {
        self.fetch(&self.url_for(segments))
    }
}

/// Segments percent-encoded one by one and joined with `/`.
pub(crate) fn encode_path(segments: &[String]) -> String {
    let encoded: Vec<String> = segments
        .iter()
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect();
    encoded.join("/")
}

pub(crate) fn from_url(url: &Url, settings: &Settings) -> Result<Path> {
    let scheme = match url.scheme.as_str() {
        "https" => HttpScheme::Https,
        _ => HttpScheme::Http,
    };
    let mut host = HttpHost::new(scheme, &url.hostname).with_settings(&settings.http);
    if let Some(port) = url.port {
        host = host.with_port(port);
    }
    if let Some(credentials) = &url.credentials {
        host = host.with_credentials(credentials.clone());
    }
    Ok(host.join(&url.path))
}
