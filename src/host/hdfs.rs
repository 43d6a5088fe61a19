use std::fmt;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::http::{HttpHost, encode_path};
use super::{Host, HostExt};
use crate::config::Settings;
use crate::error::Result;
use crate::path::Path;
use crate::stream::ByteStream;
use crate::url::Url;

/// An HDFS namenode, read through its WebHDFS REST endpoint.
///
/// `OPEN` redirects to a datanode; the HTTP client follows the redirect and
/// streams the file body.
pub struct HdfsHost {
    hostname: String,
    user: Option<String>,
    http: HttpHost,
}

impl HdfsHost {
    pub const DEFAULT_PORT: u16 = 9870;

    pub fn new(hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        let http = HttpHost::http(&hostname).with_port(Self::DEFAULT_PORT);
        Self {
            hostname,
            user: None,
            http,
        }
    }

    /// WebHDFS port on the namenode.
    pub fn with_port(mut self, port: u16) -> Self {
        self.http = self.http.with_port(port);
        self
    }

    /// Sent as `user.name` for simple authentication.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn open_url(&self, segments: &[String]) -> String {
        let mut url = format!(
            "{}/webhdfs/v1/{}?op=OPEN",
            self.http.base_url(),
            encode_path(segments)
        );
        if let Some(user) = &self.user {
            url.push_str("&user.name=");
            url.extend(utf8_percent_encode(user, NON_ALPHANUMERIC));
        }
        url
    }
}

impl fmt::Display for HdfsHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HdfsHost({})", self.hostname)
    }
}

impl Host for HdfsHost {
    fn scheme(&self) -> &str {
        "hdfs"
    }

    /// The namenode alone; port and user do not distinguish clusters.
    fn identity(&self) -> String {
        self.hostname.clone()
    }

    fn open(&self, segments: &[String]) -> Result<ByteStream> {
        self.http.fetch(&self.open_url(segments))
    }
}

pub(crate) fn from_url(url: &Url, settings: &Settings) -> Result<Path> {
    let mut host = HdfsHost::new(&url.hostname).with_port(settings.hdfs.port);
    host.http = host.http.with_settings(&settings.http);
    if let Some(user) = &settings.hdfs.user {
        host = host.with_user(user);
    }
    Ok(host.join(&url.path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_url_layout() {
        let host = HdfsHost::new("namenode").with_user("hadoop");
        let url = host.open_url(&["data".to_string(), "part 0.csv".to_string()]);
        assert_eq!(
            url,
            "http://namenode:9870/webhdfs/v1/data/part%200.csv?op=OPEN&user.name=hadoop"
        );
    }

    #[test]
    fn identity_ignores_port() {
        let a = HdfsHost::new("namenode").root_path();
        let b = HdfsHost::new("namenode").with_port(50070).root_path();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "HdfsHost(namenode)/");
    }
}
