use std::fmt;
use std::fs::File;
use std::io;
use std::path::PathBuf;

use super::{Host, HostExt};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::stream::ByteStream;
use crate::url::Url;

/// Files below a local directory.
#[derive(Debug, Clone)]
pub struct LocalHost {
    root: PathBuf,
}

impl LocalHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Relative to the process working directory at read time.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    /// The user's home directory (`$HOME`), or `/` when it is unset.
    pub fn home_dir() -> Self {
        Self::new(std::env::var_os("HOME").map_or_else(|| PathBuf::from("/"), PathBuf::from))
    }

    pub fn filesystem_root() -> Self {
        Self::new("/")
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Filesystem location of `segments`.
    pub fn resolve(&self, segments: &[String]) -> PathBuf {
        segments.iter().fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

impl fmt::Display for LocalHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalHost({})", self.root.display())
    }
}

impl Host for LocalHost {
    fn scheme(&self) -> &str {
        "file"
    }

    fn identity(&self) -> String {
        self.root.display().to_string()
    }

    fn open(&self, segments: &[String]) -> Result<ByteStream> {
        let location = self.resolve(segments);
        let denied = |e: io::Error| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                Error::not_accessible_because(location.display(), e)
            }
            _ => Error::Io(e),
        };

        let metadata = std::fs::metadata(&location).map_err(denied)?;
        if metadata.is_dir() {
            return Err(Error::not_accessible_because(location.display(), "is a directory"));
        }
        let file = File::open(&location).map_err(denied)?;
        Ok(Box::new(file))
    }
}

/// `file://[base]/path`: a non-empty hostname other than `localhost` is the
/// base directory, otherwise `settings.local.root`.
pub(crate) fn from_url(url: &Url, settings: &Settings) -> Result<Path> {
    let host = match url.hostname.as_str() {
        "" | "localhost" => LocalHost::new(&settings.local.root),
        base => LocalHost::new(base),
    };
    Ok(host.join(&url.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_file_below_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/file.txt"), "local").unwrap();

        let path = LocalHost::new(dir.path()).join("sub/file.txt");
        assert_eq!(path.read_text().unwrap(), "local");
    }

    #[test]
    fn missing_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let root = LocalHost::new(dir.path()).root_path();

        assert!((&root / "missing").read_bytes().unwrap_err().is_not_accessible());
        assert!((&root / "sub").read_bytes().unwrap_err().is_not_accessible());
    }

    #[test]
    fn identity_is_root_directory() {
        let a = LocalHost::new("/tmp").root_path();
        let b = LocalHost::new("/tmp").root_path();
        let c = LocalHost::filesystem_root().root_path();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "LocalHost(/tmp)/");
    }

    #[test]
    fn url_hostname_is_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), "[tool]").unwrap();

        let mut settings = Settings::default();
        settings.local.root = dir.path().to_path_buf();
        let path = from_url(&Url::parse("file:///readme.txt").unwrap(), &settings).unwrap();
        assert_eq!(path.read_bytes().unwrap(), b"[tool]");

        let path = from_url(&Url::parse("file://base/dir/x").unwrap(), &settings).unwrap();
        assert_eq!(path.to_string(), "LocalHost(base)/dir/x");
    }
}
