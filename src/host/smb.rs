use std::fmt;
use std::io::Cursor;

use super::{Host, HostExt};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::stream::ByteStream;
use crate::url::{Credentials, Url};

/// A Windows/Samba file server. The first segment names the share.
///
/// libsmbclient contexts cannot move between threads, so each open builds
/// its own client and drops it once the file is read.
#[cfg_attr(not(feature = "smb"), allow(dead_code))]
pub struct SmbHost {
    hostname: String,
    credentials: Option<Credentials>,
    workgroup: Option<String>,
}

impl SmbHost {
    pub fn new(hostname: impl Into<String>) -> Self {
        let host = Self {
            hostname: hostname.into(),
            credentials: None,
            workgroup: None,
        };
        if !cfg!(feature = "smb") {
            tracing::warn!(host = %host, "smb support is not compiled in");
        }
        host
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_workgroup(mut self, workgroup: impl Into<String>) -> Self {
        self.workgroup = Some(workgroup.into());
        self
    }

    /// `\\host\share\dir\file` form of `segments`.
    pub fn unc_path(&self, segments: &[String]) -> String {
        let mut unc = format!(r"\\{}", self.hostname);
        for segment in segments {
            unc.push('\\');
            unc.push_str(segment);
        }
        unc
    }
}

impl fmt::Display for SmbHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SmbHost({})", self.hostname)
    }
}

impl Host for SmbHost {
    fn scheme(&self) -> &str {
        "smb"
    }

    fn identity(&self) -> String {
        self.hostname.clone()
    }

    fn open(&self, segments: &[String]) -> Result<ByteStream> {
        let [share, file @ ..] = segments else {
            return Err(Error::InvalidPath {
                path: self.to_string(),
                reason: "an SMB path starts with the share name",
            });
        };
        if file.is_empty() {
            return Err(Error::InvalidPath {
                path: self.unc_path(segments),
                reason: "an SMB path must name a file inside the share",
            });
        }
        let data = client::read(self, share, file)?;
        Ok(Box::new(Cursor::new(data)))
    }
}

pub(crate) fn from_url(url: &Url, _settings: &Settings) -> Result<Path> {
    let mut host = SmbHost::new(&url.hostname);
    if let Some(credentials) = &url.credentials {
        host = host.with_credentials(credentials.clone());
    }
    Ok(host.join(&url.path))
}

#[cfg(feature = "smb")]
mod client {
    use std::io::Read;

    use pavao::{SmbClient, SmbCredentials, SmbOpenOptions, SmbOptions};

    use super::SmbHost;
    use crate::error::{Error, Result};

    pub(super) fn read(host: &SmbHost, share: &str, file: &[String]) -> Result<Vec<u8>> {
        let mut credentials = SmbCredentials::default()
            .server(format!("smb://{}", host.hostname))
            .share(format!("/{share}"));
        if let Some(login) = &host.credentials {
            credentials = credentials.username(&login.username).password(login.password());
        }
        if let Some(workgroup) = &host.workgroup {
            credentials = credentials.workgroup(workgroup);
        }

        let client = SmbClient::new(credentials, SmbOptions::default().one_share_per_server(true))
            .map_err(|e| Error::no_connection(host, e.to_string()))?;
        tracing::debug!(host = %host, share, "smb client ready");

        let location = {
            let mut segments = vec![share.to_string()];
            segments.extend_from_slice(file);
            host.unc_path(&segments)
        };
        let mut reader = client
            .open_with(format!("/{}", file.join("/")), SmbOpenOptions::default().read(true))
            .map_err(|e| Error::not_accessible_because(&location, e.to_string()))?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

#[cfg(not(feature = "smb"))]
mod client {
    use super::SmbHost;
    use crate::error::{Error, Result};

    pub(super) fn read(_host: &SmbHost, _share: &str, _file: &[String]) -> Result<Vec<u8>> {
        Err(Error::BackendUnavailable {
            scheme: "smb",
            feature: "smb",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unc_form() {
        let host = SmbHost::new("fileserver");
        let segments = ["public".to_string(), "docs".to_string(), "a.txt".to_string()];
        assert_eq!(host.unc_path(&segments), r"\\fileserver\public\docs\a.txt");
    }

    #[test]
    fn share_alone_is_not_a_file() {
        let host = SmbHost::new("fileserver");
        let err = host.join("public").read_bytes().unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn credentials_are_not_identity() {
        let a = SmbHost::new("fs").root_path();
        let b = SmbHost::new("fs")
            .with_credentials(Credentials::new("u", "p"))
            .root_path();
        assert_eq!(a, b);
    }
}
