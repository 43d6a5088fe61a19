//! Immutable paths over hosts and archives.
//!
//! A [`Path`] is a root plus a list of segments. Building one never touches
//! the network or the filesystem; only the read methods do. Joining a segment
//! whose name ends in a registered archive suffix turns everything so far
//! into an [`Archive`] root, and later segments address members inside it.

use std::fmt;
use std::io::Read;
use std::ops::Div;
use std::sync::Arc;

use crate::archive::{Archive, ExtensionRegistry};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::stream::{ByteStream, OpenFile, OpenMode, PathFile, TextFile};

/// What a path's segments are resolved against.
#[derive(Clone)]
pub enum Root {
    Host(Arc<dyn Host>),
    Archive(Arc<Archive>),
}

impl Root {
    fn open(&self, segments: &[String]) -> Result<ByteStream> {
        match self {
            Root::Host(host) => host.open(segments),
            Root::Archive(archive) => archive.open(segments),
        }
    }

    pub fn as_host(&self) -> Option<&Arc<dyn Host>> {
        match self {
            Root::Host(host) => Some(host),
            Root::Archive(_) => None,
        }
    }

    pub fn as_archive(&self) -> Option<&Arc<Archive>> {
        match self {
            Root::Archive(archive) => Some(archive),
            Root::Host(_) => None,
        }
    }
}

impl PartialEq for Root {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Root::Host(a), Root::Host(b)) => {
                a.scheme() == b.scheme() && a.identity() == b.identity()
            }
            (Root::Archive(a), Root::Archive(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Eq for Root {}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Root::Host(host) => fmt::Display::fmt(host, f),
            Root::Archive(archive) => fmt::Display::fmt(archive, f),
        }
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A root plus an ordered list of segments.
#[derive(Clone, PartialEq, Eq)]
pub struct Path {
    root: Root,
    segments: Vec<String>,
}

impl Path {
    /// The root path (no segments) of `root`.
    pub fn new(root: Root) -> Self {
        Self {
            root,
            segments: Vec::new(),
        }
    }

    pub fn from_host(host: Arc<dyn Host>) -> Self {
        Self::new(Root::Host(host))
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, if any.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        self.name().is_some_and(|name| name.ends_with(extension))
    }

    /// Segments joined with `/`, without the root.
    pub fn relative(&self) -> String {
        self.segments.join("/")
    }

    /// Append `segment`, splitting it on `/` and checking every piece
    /// against the global extension registry.
    pub fn join(&self, segment: &str) -> Path {
        self.join_with(segment, ExtensionRegistry::global())
    }

    /// [`Path::join`] against an explicit extension registry.
    pub fn join_with(&self, segment: &str, registry: &ExtensionRegistry) -> Path {
        let mut path = self.clone();
        for piece in pieces(segment) {
            path = path.push(piece, registry).0;
        }
        path
    }

    /// Like [`Path::join`], but the last piece of `segment` must name an
    /// archive.
    pub fn join_archive(&self, segment: &str) -> Result<Path> {
        let registry = ExtensionRegistry::global();
        let mut path = self.clone();
        let mut intercepted = false;
        for piece in pieces(segment) {
            (path, intercepted) = path.push(piece, registry);
        }
        if intercepted {
            Ok(path)
        } else {
            Err(Error::UnsupportedExtension {
                segment: segment.to_string(),
            })
        }
    }

    /// The path without its last segment. A root path is its own parent.
    pub fn parent(&self) -> Path {
        let mut parent = self.clone();
        parent.segments.pop();
        parent
    }

    fn push(mut self, piece: &str, registry: &ExtensionRegistry) -> (Path, bool) {
        self.segments.push(piece.to_string());
        match registry.format_for(piece) {
            Some(format) => {
                tracing::trace!(path = %self, format = format.name(), "entering archive");
                let archive = Archive::new(format, self);
                (Path::new(Root::Archive(Arc::new(archive))), true)
            }
            None => (self, false),
        }
    }

    /// The raw stream from the root. Callers own it until drop.
    pub(crate) fn open_raw(&self) -> Result<ByteStream> {
        tracing::debug!(path = %self, "opening");
        self.root.open(&self.segments)
    }

    /// The whole resource.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let mut stream = self.open_raw()?;
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        Ok(data)
    }

    /// The whole resource decoded as UTF-8.
    pub fn read_text(&self) -> Result<String> {
        String::from_utf8(self.read_bytes()?).map_err(|source| Error::Utf8 {
            path: self.to_string(),
            source,
        })
    }

    /// A seekable binary reader that buffers the stream as it is consumed.
    pub fn open(&self) -> Result<PathFile> {
        Ok(PathFile::new(self.to_string(), self.open_raw()?))
    }

    pub fn open_text(&self) -> Result<TextFile> {
        Ok(TextFile::new(self.open()?))
    }

    pub fn open_mode(&self, mode: OpenMode) -> Result<OpenFile> {
        Ok(match mode {
            OpenMode::Binary => OpenFile::Binary(self.open()?),
            OpenMode::Text => OpenFile::Text(self.open_text()?),
        })
    }
}

fn pieces(segment: &str) -> impl Iterator<Item = &str> {
    segment.split('/').filter(|piece| !piece.is_empty())
}

impl Div<&str> for &Path {
    type Output = Path;

    fn div(self, segment: &str) -> Path {
        self.join(segment)
    }
}

impl Div<&str> for Path {
    type Output = Path;

    fn div(self, segment: &str) -> Path {
        self.join(segment)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.root, self.relative())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Chunk;
    use std::collections::HashMap;
    use std::io::{Cursor, Seek, SeekFrom};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory host keyed by the joined segments.
    struct MemoryHost {
        name: &'static str,
        files: HashMap<String, Vec<u8>>,
        opens: AtomicUsize,
    }

    impl MemoryHost {
        fn new(name: &'static str, files: &[(&str, &[u8])]) -> Arc<Self> {
            Arc::new(Self {
                name,
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_vec()))
                    .collect(),
                opens: AtomicUsize::new(0),
            })
        }
    }

    impl fmt::Display for MemoryHost {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "MemoryHost({})", self.name)
        }
    }

    impl Host for MemoryHost {
        fn scheme(&self) -> &str {
            "memory"
        }

        fn identity(&self) -> String {
            self.name.to_string()
        }

        fn open(&self, segments: &[String]) -> Result<ByteStream> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            let key = segments.join("/");
            let data = self
                .files
                .get(&key)
                .ok_or_else(|| Error::not_accessible(format!("{self}/{key}")))?;
            Ok(Box::new(Cursor::new(data.clone())))
        }
    }

    fn root(host: Arc<MemoryHost>) -> Path {
        Path::from_host(host)
    }

    #[test]
    fn segments_accumulate_in_order() {
        let base = root(MemoryHost::new("m", &[]));
        let path = &base / "a" / "b" / "c";
        assert_eq!(path.segments(), ["a", "b", "c"]);
        assert_eq!(path.name(), Some("c"));
        assert_eq!(path.relative(), "a/b/c");
        assert!(base.is_root());
    }

    #[test]
    fn join_does_not_mutate() {
        let p1 = root(MemoryHost::new("m", &[])) / "a";
        let p2 = p1.join("x");
        assert_eq!(p1.segments(), ["a"]);
        assert_eq!(p2.segments(), ["a", "x"]);
    }

    #[test]
    fn separators_split_and_empty_pieces_drop() {
        let base = root(MemoryHost::new("m", &[]));
        assert_eq!((&base / "a" / "1/2").segments(), ["a", "1", "2"]);
        assert_eq!((&base / "/x//y/").segments(), ["x", "y"]);
        assert_eq!(&base / "", base);
    }

    #[test]
    fn equality_uses_host_identity() {
        let a = root(MemoryHost::new("same", &[])) / "f";
        let b = root(MemoryHost::new("same", &[])) / "f";
        let c = root(MemoryHost::new("other", &[])) / "f";
        assert_eq!(a, a.clone());
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_ne!(a, c);
        assert_ne!(a, a.join("g"));
    }

    #[test]
    fn parent_of_root_is_root() {
        let base = root(MemoryHost::new("m", &[]));
        assert_eq!(base.parent(), base);
        assert_eq!((&base / "a" / "b").parent(), &base / "a");
    }

    #[test]
    fn display_and_debug() {
        let path = root(MemoryHost::new("m", &[])) / "a" / "b";
        assert_eq!(path.to_string(), "MemoryHost(m)/a/b");
        assert_eq!(format!("{path:?}"), "Path(MemoryHost(m)/a/b)");
    }

    #[test]
    fn archive_segment_swaps_root() {
        let base = root(MemoryHost::new("m", &[]));
        let inner = &base / "dir" / "bundle.zip" / "inside.txt";
        assert_eq!(inner.segments(), ["inside.txt"]);

        let archive = inner.root().as_archive().unwrap();
        assert_eq!(archive.format_name(), "zip");
        assert_eq!(archive.path(), &(&base / "dir" / "bundle.zip"));
        assert_eq!(inner.to_string(), "ZipArchive(MemoryHost(m)/dir/bundle.zip)/inside.txt");
    }

    #[test]
    fn archives_nest() {
        let base = root(MemoryHost::new("m", &[]));
        let path = &base / "outer.tar/inner.zip" / "file.txt";
        let inner = path.root().as_archive().unwrap();
        let outer = inner.path().root().as_archive().unwrap();
        assert_eq!(outer.format_name(), "tar");
        assert_eq!(outer.path().segments(), ["outer.tar"]);
        assert_eq!(inner.path().segments(), ["inner.zip"]);
    }

    #[test]
    fn join_archive_is_strict() {
        let base = root(MemoryHost::new("m", &[]));
        assert!(base.join_archive("data.tgz").unwrap().is_root());
        let err = base.join_archive("data.txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedExtension { .. }));
    }

    #[test]
    fn empty_registry_never_intercepts() {
        let base = root(MemoryHost::new("m", &[]));
        let path = base.join_with("a.zip/b", &ExtensionRegistry::new());
        assert_eq!(path.segments(), ["a.zip", "b"]);
        assert!(path.has_extension("b"));
        assert!(path.root().as_host().is_some());
    }

    #[test]
    fn reads_are_deferred() {
        let host = MemoryHost::new("m", &[("a/b.txt", &b"hello"[..])]);
        let path = root(host.clone()) / "a" / "b.txt";
        assert_eq!(host.opens.load(Ordering::SeqCst), 0);

        assert_eq!(path.read_bytes().unwrap(), b"hello");
        assert_eq!(path.read_text().unwrap(), "hello");
        assert_eq!(host.opens.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_file_and_bad_utf8() {
        let host = MemoryHost::new("m", &[("bin", &[0xffu8, 0xfe][..])]);
        let base = root(host);
        assert!((&base / "nope").read_bytes().unwrap_err().is_not_accessible());
        assert!(matches!(
            (&base / "bin").read_text().unwrap_err(),
            Error::Utf8 { .. }
        ));
    }

    #[test]
    fn open_modes() {
        let host = MemoryHost::new("m", &[("t.txt", "héllo".as_bytes())]);
        let path = root(host) / "t.txt";

        let mut file = path.open().unwrap();
        assert_eq!(file.read_chunk(Some(2)).unwrap(), b"h\xc3");
        file.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(file.read_chunk(None).unwrap(), "héllo".as_bytes());

        let mut text = path.open_text().unwrap();
        assert_eq!(text.read(Some(2)).unwrap(), "hé");

        let mut opened = path.open_mode(OpenMode::Text).unwrap();
        assert_eq!(opened.mode(), OpenMode::Text);
        assert_eq!(opened.read(Some(2)).unwrap(), Chunk::Text("hé".into()));
        assert_eq!(opened.tell(), 3);
        assert_eq!(opened.read(None).unwrap(), Chunk::Text("llo".into()));
        assert!(opened.read(Some(4)).unwrap().is_empty());
        assert!(opened.into_text().is_some());

        let mut opened = path.open_mode(OpenMode::Binary).unwrap();
        assert_eq!(opened.mode(), OpenMode::Binary);
        assert_eq!(opened.read(Some(2)).unwrap(), Chunk::Bytes(b"h\xc3".to_vec()));
        opened.seek(SeekFrom::Start(1)).unwrap();
        assert_eq!(opened.read(None).unwrap().as_bytes(), "éllo".as_bytes());
        assert!(opened.into_binary().is_some());
    }

    #[test]
    fn archive_root_reads_raw_bytes() {
        let host = MemoryHost::new("m", &[("a.zip", &b"raw zip bytes"[..])]);
        let archive_root = root(host) / "a.zip";
        assert!(archive_root.is_root());
        assert_eq!(archive_root.read_bytes().unwrap(), b"raw zip bytes");
    }
}
