use std::fmt;
use std::fs::File;
use std::path::PathBuf;

use super::{Host, HostExt};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::stream::ByteStream;
use crate::url::Url;

/// Data files installed alongside a named package.
///
/// A resource is looked up in each configured root in turn, then in the XDG
/// data directories (`$XDG_DATA_HOME/<name>`, `$XDG_DATA_DIRS/<name>`).
#[derive(Debug, Clone)]
pub struct PackageHost {
    name: String,
    roots: Vec<PathBuf>,
}

impl PackageHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roots: Vec::new(),
        }
    }

    /// Directories searched before the XDG data directories.
    pub fn with_roots(mut self, roots: impl IntoIterator<Item = PathBuf>) -> Self {
        self.roots.extend(roots);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First existing file for `segments`.
    pub fn locate(&self, segments: &[String]) -> Option<PathBuf> {
        let relative: PathBuf = segments.iter().collect();
        let found = self
            .roots
            .iter()
            .map(|root| root.join(&relative))
            .find(|candidate| candidate.is_file());
        if found.is_some() {
            return found;
        }

        xdg::BaseDirectories::with_prefix(&self.name)
            .ok()?
            .find_data_file(&relative)
            .filter(|candidate| candidate.is_file())
    }
}

impl fmt::Display for PackageHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageHost({})", self.name)
    }
}

impl Host for PackageHost {
    fn scheme(&self) -> &str {
        "package"
    }

    fn identity(&self) -> String {
        self.name.clone()
    }

    fn open(&self, segments: &[String]) -> Result<ByteStream> {
        let location = format!("{self}/{}", segments.join("/"));
        let file = self.locate(segments).ok_or_else(|| Error::not_accessible(&location))?;
        tracing::debug!(resource = %location, file = %file.display(), "package resource");
        let file = File::open(&file).map_err(|e| Error::not_accessible_because(&location, e))?;
        Ok(Box::new(file))
    }
}

/// `package://<name>/resource`: `package.roots[<name>]` first, then
/// `<dir>/<name>` for every entry of `package.search_dirs`.
pub(crate) fn from_url(url: &Url, settings: &Settings) -> Result<Path> {
    let name = url.hostname.as_str();
    let explicit = settings.package.roots.get(name).cloned();
    let searched = settings.package.search_dirs.iter().map(|dir| dir.join(name));
    let host = PackageHost::new(name).with_roots(explicit.into_iter().chain(searched));
    Ok(host.join(&url.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn explicit_root_then_search_dirs() {
        let explicit = tempfile::tempdir().unwrap();
        let search = tempfile::tempdir().unwrap();
        fs::create_dir_all(search.path().join("mytool/data")).unwrap();
        fs::write(search.path().join("mytool/data/defaults.toml"), "from search").unwrap();
        fs::write(search.path().join("mytool/data/only.txt"), "only here").unwrap();
        fs::create_dir_all(explicit.path().join("data")).unwrap();
        fs::write(explicit.path().join("data/defaults.toml"), "from root").unwrap();

        let mut settings = Settings::default();
        settings
            .package
            .roots
            .insert("mytool".into(), explicit.path().to_path_buf());
        settings.package.search_dirs.push(search.path().to_path_buf());

        let url = Url::parse("package://mytool/data/defaults.toml").unwrap();
        let path = from_url(&url, &settings).unwrap();
        assert_eq!(path.read_text().unwrap(), "from root");

        let url = Url::parse("package://mytool/data/only.txt").unwrap();
        assert_eq!(from_url(&url, &settings).unwrap().read_text().unwrap(), "only here");
    }

    #[test]
    fn missing_resource() {
        let dir = tempfile::tempdir().unwrap();
        let host = PackageHost::new("anypath-test-no-such-package")
            .with_roots([dir.path().to_path_buf()]);
        let err = host.join("nothing/here.txt").read_bytes().unwrap_err();
        assert!(err.is_not_accessible());
    }
}
