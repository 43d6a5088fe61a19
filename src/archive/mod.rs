//! Archives as virtual roots.
//!
//! When a path segment ends in a registered suffix, the path so far becomes
//! the backing file of an [`Archive`] and later segments name a member
//! inside it. Every open reads the backing file in full, parses the container
//! in memory and extracts the one member; nothing is cached between opens.

mod tar;
mod zip;

pub use self::tar::{TarEntry, TarFormat};
pub use self::zip::{ZipFileEntry, ZipFormat};

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::path::Path;
use crate::stream::ByteStream;

/// A container format that can extract a single member from raw bytes.
pub trait ArchiveFormat: Send + Sync {
    /// Short format name used in errors, e.g. `"zip"`.
    fn name(&self) -> &'static str;

    /// Label used when displaying an archive root, e.g. `"ZipArchive"`.
    fn label(&self) -> &'static str;

    /// Filename suffixes claimed by this format, leading dot included.
    fn extensions(&self) -> &'static [&'static str];

    /// Extract `member` from the complete archive bytes.
    ///
    /// A member that is absent or not a regular file yields
    /// `FileNotAccessible`; an unreadable container yields
    /// `MalformedArchive`.
    fn open_member(&self, data: Vec<u8>, member: &str) -> Result<ByteStream>;
}

/// A virtual root backed by the bytes at `path`.
#[derive(Clone)]
pub struct Archive {
    format: Arc<dyn ArchiveFormat>,
    path: Path,
}

impl Archive {
    pub fn new(format: Arc<dyn ArchiveFormat>, path: Path) -> Self {
        Self { format, path }
    }

    pub fn format_name(&self) -> &'static str {
        self.format.name()
    }

    /// The path of the archive file itself.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the member named by `segments` joined with `/`.
    ///
    /// No segments means the archive file itself, so the root path of an
    /// archive reads the raw container bytes.
    pub fn open(&self, segments: &[String]) -> Result<ByteStream> {
        if segments.is_empty() {
            return self.path.open_raw();
        }
        let member = segments.join("/");
        tracing::debug!(archive = %self, member = %member, "extracting member");
        let data = self.path.read_bytes()?;
        self.format.open_member(data, &member)
    }
}

impl PartialEq for Archive {
    fn eq(&self, other: &Self) -> bool {
        self.format.name() == other.format.name() && self.path == other.path
    }
}

impl Eq for Archive {}

impl fmt::Display for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.format.label(), self.path)
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Member names are compared after dropping leading `./` and `/` and any
/// trailing `/`.
pub(crate) fn normalize_member(name: &str) -> &str {
    let mut name = name;
    loop {
        if let Some(rest) = name.strip_prefix("./") {
            name = rest;
        } else if let Some(rest) = name.strip_prefix('/') {
            name = rest;
        } else {
            break;
        }
    }
    name.trim_end_matches('/')
}

/// Ordered suffix → format table.
///
/// Lookups scan the table in order and take the first suffix that matches,
/// so longer suffixes are kept ahead of shorter ones (`.tar.gz` before
/// `.gz`). Equal-length suffixes keep registration order.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    entries: Vec<(&'static str, Arc<dyn ArchiveFormat>)>,
}

static GLOBAL_EXTENSIONS: OnceLock<ExtensionRegistry> = OnceLock::new();

impl ExtensionRegistry {
    /// An empty registry; no segment triggers an archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tar (`.tar.gz`, `.tgz`, `.tar`) and zip (`.zip`, `.dep`).
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TarFormat));
        registry.register(Arc::new(ZipFormat));
        registry
    }

    /// Add every suffix of `format`. A suffix registered twice is taken over
    /// by the newer format.
    pub fn register(&mut self, format: Arc<dyn ArchiveFormat>) {
        for &suffix in format.extensions() {
            self.entries.retain(|(existing, _)| *existing != suffix);
            let at = self
                .entries
                .iter()
                .position(|(existing, _)| existing.len() < suffix.len())
                .unwrap_or(self.entries.len());
            self.entries.insert(at, (suffix, Arc::clone(&format)));
        }
    }

    /// The format whose suffix `segment` ends with, most specific first.
    pub fn format_for(&self, segment: &str) -> Option<Arc<dyn ArchiveFormat>> {
        self.entries
            .iter()
            .find(|(suffix, _)| segment.ends_with(suffix))
            .map(|(_, format)| Arc::clone(format))
    }

    /// Suffixes in match order.
    pub fn suffixes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(suffix, _)| *suffix)
    }

    /// The process-wide registry used by [`Path::join`].
    ///
    /// Built from [`ExtensionRegistry::with_builtin`] on first use unless
    /// [`ExtensionRegistry::install`] ran earlier.
    pub fn global() -> &'static ExtensionRegistry {
        GLOBAL_EXTENSIONS.get_or_init(ExtensionRegistry::with_builtin)
    }

    /// Make `self` the process-wide registry. Fails, handing the registry
    /// back, once the global registry has been set or used.
    pub fn install(self) -> std::result::Result<(), ExtensionRegistry> {
        GLOBAL_EXTENSIONS.set(self)
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(suffix, format)| (suffix, format.name())))
            .finish()
    }
}
