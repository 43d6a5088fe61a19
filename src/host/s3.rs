use std::fmt;
use std::io::Cursor;

use super::{Host, HostExt, Lazy};
use crate::config::{S3Settings, Settings};
use crate::error::{Error, Result};
use crate::path::Path;
use crate::stream::ByteStream;
use crate::url::Url;

/// One S3 bucket. Segments joined with `/` form the object key.
///
/// Keys come from [`S3Host::with_static_keys`] or, when unset, the standard
/// AWS environment variables and profile files.
#[cfg_attr(not(feature = "s3"), allow(dead_code))]
pub struct S3Host {
    bucket: String,
    region: String,
    endpoint: Option<String>,
    keys: Option<(String, String)>,
    handle: Lazy<client::Handle>,
}

impl S3Host {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        let host = Self {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: None,
            keys: None,
            handle: Lazy::new(),
        };
        if !cfg!(feature = "s3") {
            tracing::warn!(host = %host, "s3 support is not compiled in");
        }
        host
    }

    /// S3-compatible endpoint (MinIO, Ceph); uses path-style requests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_static_keys(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.keys = Some((access_key.into(), secret_key.into()));
        self
    }

    fn with_settings(self, settings: &S3Settings) -> Self {
        let mut host = self;
        if let Some(endpoint) = &settings.endpoint {
            host = host.with_endpoint(endpoint);
        }
        if let (Some(access), Some(secret)) = (&settings.access_key, &settings.secret_key) {
            host = host.with_static_keys(access, secret);
        }
        host
    }
}

impl fmt::Display for S3Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S3Host({}@{})", self.bucket, self.region)
    }
}

impl Host for S3Host {
    fn scheme(&self) -> &str {
        "s3"
    }

    fn identity(&self) -> String {
        format!("{}@{}", self.bucket, self.region)
    }

    fn open(&self, segments: &[String]) -> Result<ByteStream> {
        let key = segments.join("/");
        if key.is_empty() {
            return Err(Error::InvalidPath {
                path: self.to_string(),
                reason: "an S3 path must name an object key",
            });
        }
        let location = format!("{self}/{key}");
        let data = self.handle.with(
            self,
            || client::connect(self),
            |handle| handle.get(self, &location, &key),
        )?;
        Ok(Box::new(Cursor::new(data)))
    }
}

/// `s3://bucket/key`; region, endpoint and keys come from settings.
pub(crate) fn from_url(url: &Url, settings: &Settings) -> Result<Path> {
    let host = S3Host::new(&url.hostname, &settings.s3.region).with_settings(&settings.s3);
    Ok(host.join(&url.path))
}

#[cfg(feature = "s3")]
mod client {
    use s3::bucket::Bucket;
    use s3::creds::Credentials;
    use s3::error::S3Error;
    use s3::region::Region;

    use super::S3Host;
    use crate::error::{Error, Result};

    pub(super) struct Handle {
        bucket: Box<Bucket>,
    }

    pub(super) fn connect(host: &S3Host) -> Result<Handle> {
        let region = match &host.endpoint {
            Some(endpoint) => Region::Custom {
                region: host.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => host
                .region
                .parse::<Region>()
                .map_err(|e| Error::no_connection(host, e.to_string()))?,
        };

        let credentials = match &host.keys {
            Some((access, secret)) => {
                Credentials::new(Some(access.as_str()), Some(secret.as_str()), None, None, None)
            }
            None => Credentials::default(),
        }
        .map_err(|e| Error::no_connection(host, e.to_string()))?;

        let mut bucket = Bucket::new(&host.bucket, region, credentials)
            .map_err(|e| Error::no_connection(host, e.to_string()))?;
        if host.endpoint.is_some() {
            bucket = bucket.with_path_style();
        }
        Ok(Handle { bucket })
    }

    impl Handle {
        pub(super) fn get(&mut self, host: &S3Host, location: &str, key: &str) -> Result<Vec<u8>> {
            let response = self.bucket.get_object(key).map_err(|e| match e {
                S3Error::HttpFailWithBody(status, _) => {
                    Error::not_accessible_because(location, format!("HTTP {status}"))
                }
                other => Error::no_connection(host, other.to_string()),
            })?;

            let status = response.status_code();
            if status != 200 {
                return Err(Error::not_accessible_because(location, format!("HTTP {status}")));
            }
            Ok(response.bytes().to_vec())
        }
    }
}

#[cfg(not(feature = "s3"))]
mod client {
    use super::S3Host;
    use crate::error::{Error, Result};

    pub(super) enum Handle {}

    pub(super) fn connect(_host: &S3Host) -> Result<Handle> {
        Err(Error::BackendUnavailable {
            scheme: "s3",
            feature: "s3",
        })
    }

    impl Handle {
        pub(super) fn get(
            &mut self,
            _host: &S3Host,
            _location: &str,
            _key: &str,
        ) -> Result<Vec<u8>> {
            match *self {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_from_hostname_and_region_from_settings() {
        let mut settings = Settings::default();
        settings.s3.region = "eu-central-1".into();
        let url = Url::parse("s3://my-bucket/data/file.csv").unwrap();
        let path = from_url(&url, &settings).unwrap();
        assert_eq!(path.to_string(), "S3Host(my-bucket@eu-central-1)/data/file.csv");
    }

    #[test]
    fn bucket_root_is_not_an_object() {
        let err = S3Host::new("b", "us-east-1").root_path().read_bytes().unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }
}
