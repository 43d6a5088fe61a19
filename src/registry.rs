//! Scheme dispatch: URL string → host → root path.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::host;
use crate::path::Path;
use crate::url::Url;

/// Builds the host for a parsed URL and joins the URL path onto it.
pub type HostFactory = fn(&Url, &Settings) -> Result<Path>;

/// Scheme → factory table. Lookups are exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct SchemeRegistry {
    factories: HashMap<String, HostFactory>,
}

impl SchemeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in scheme: `file`, `http`, `https`, `ftp`, `ftps`,
    /// `sftp`, `smb`, `s3`, `hdfs`, `package`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        host::register_builtin(&mut registry);
        registry
    }

    /// Register `factory` for `scheme`, returning the factory it replaced.
    pub fn register(
        &mut self,
        scheme: impl Into<String>,
        factory: HostFactory,
    ) -> Option<HostFactory> {
        self.factories.insert(scheme.into(), factory)
    }

    pub fn get(&self, scheme: &str) -> Option<HostFactory> {
        self.factories.get(scheme).copied()
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    pub fn resolve(&self, url: &str, settings: &Settings) -> Result<Path> {
        self.resolve_url(&Url::parse(url)?, settings)
    }

    pub fn resolve_url(&self, url: &Url, settings: &Settings) -> Result<Path> {
        let factory = self.get(&url.scheme).ok_or_else(|| Error::UnknownScheme {
            scheme: url.scheme.clone(),
        })?;
        let path = factory(url, settings)?;
        tracing::debug!(scheme = %url.scheme, path = %path, "resolved url");
        Ok(path)
    }
}

/// A registry paired with the settings its factories receive.
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: SchemeRegistry,
    settings: Settings,
}

static DEFAULT_RESOLVER: OnceLock<Resolver> = OnceLock::new();

impl Resolver {
    pub fn new(registry: SchemeRegistry, settings: Settings) -> Self {
        Self { registry, settings }
    }

    /// Built-in schemes with `settings`.
    pub fn with_settings(settings: Settings) -> Self {
        Self::new(SchemeRegistry::with_builtin(), settings)
    }

    pub fn registry(&self) -> &SchemeRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolve(&self, url: &str) -> Result<Path> {
        self.registry.resolve(url, &self.settings)
    }

    /// Built-in schemes and default settings, created on first use.
    pub fn global() -> &'static Resolver {
        DEFAULT_RESOLVER.get_or_init(Resolver::default)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::with_settings(Settings::default())
    }
}

/// Resolve `url` with the built-in schemes and default settings.
///
/// ```no_run
/// let readme = anypath::from_url("https://example.com/docs/readme.txt")?;
/// println!("{}", readme.read_text()?);
/// # Ok::<(), anypath::Error>(())
/// ```
pub fn from_url(url: &str) -> Result<Path> {
    Resolver::global().resolve(url)
}
