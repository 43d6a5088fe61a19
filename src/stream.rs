//! Seekable reads over forward-only byte sources.
//!
//! Most transports hand back a stream that can only move forward (a chunked
//! HTTP body, an FTP data channel). Callers still want to read a fixed chunk,
//! inspect it and seek back. [`StreamBuffer`] keeps every byte pulled from the
//! source so far and serves reads and seeks from that buffer, pulling more
//! chunks only when a request reaches past what is already held.

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{Error, Result};

/// Raw byte source returned by a host or archive `open`.
pub type ByteStream = Box<dyn Read + Send>;

/// Chunk size used when adapting a reader into a chunk iterator.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Iterator of byte chunks pulled from a forward-only reader.
pub struct Chunks<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> Chunks<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }
}

impl<R: Read> Iterator for Chunks<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => {
                    chunk.truncate(n);
                    return Some(Ok(chunk));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Growable in-memory window over a chunk iterator.
///
/// Invariant: `buffer` holds the source's bytes `0..buffer.len()` in order;
/// `source` is `None` once the iterator reported its end or an error. After an
/// error, every read that needs bytes past the buffer fails with the same kind.
pub struct StreamBuffer<I> {
    buffer: Vec<u8>,
    position: u64,
    source: Option<I>,
    failed: Option<io::ErrorKind>,
}

impl<I> StreamBuffer<I>
where
    I: Iterator<Item = io::Result<Vec<u8>>>,
{
    pub fn new(chunks: I) -> Self {
        Self {
            buffer: Vec::new(),
            position: 0,
            source: Some(chunks),
            failed: None,
        }
    }

    /// Current logical read position.
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Number of bytes materialized from the source so far.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// True once the underlying iterator ended cleanly.
    pub fn is_exhausted(&self) -> bool {
        self.source.is_none() && self.failed.is_none()
    }

    /// Read up to `size` bytes, or everything that is left for `None`.
    ///
    /// A short result means the source ended.
    pub fn read_chunk(&mut self, size: Option<usize>) -> io::Result<Vec<u8>> {
        let start = self.position;
        let goal = match size {
            Some(n) => start.saturating_add(n as u64),
            None => u64::MAX,
        };
        self.load_until(goal)?;

        let (from, to) = self.window(start, goal);
        let out = self.buffer[from..to].to_vec();
        self.position = start + (to - from) as u64;
        Ok(out)
    }

    fn window(&self, start: u64, goal: u64) -> (usize, usize) {
        let len = self.buffer.len() as u64;
        (start.min(len) as usize, goal.min(len) as usize)
    }

    fn load_until(&mut self, goal: u64) -> io::Result<()> {
        while (self.buffer.len() as u64) < goal {
            if let Some(kind) = self.failed {
                return Err(io::Error::new(kind, "stream failed on an earlier read"));
            }
            let Some(source) = self.source.as_mut() else {
                break;
            };
            match source.next() {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    self.failed = Some(e.kind());
                    self.source = None;
                    return Err(e);
                }
                None => self.source = None,
            }
        }
        Ok(())
    }

    fn load_all(&mut self) -> io::Result<()> {
        self.load_until(u64::MAX)
    }
}

impl<I> Read for StreamBuffer<I>
where
    I: Iterator<Item = io::Result<Vec<u8>>>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = self.position;
        let goal = start.saturating_add(buf.len() as u64);
        self.load_until(goal)?;

        let (from, to) = self.window(start, goal);
        let n = to - from;
        buf[..n].copy_from_slice(&self.buffer[from..to]);
        self.position += n as u64;
        Ok(n)
    }
}

impl<I> Seek for StreamBuffer<I>
where
    I: Iterator<Item = io::Result<Vec<u8>>>,
{
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(offset) => self.position.checked_add_signed(offset),
            SeekFrom::End(offset) => {
                self.load_all()?;
                (self.buffer.len() as u64).checked_add_signed(offset)
            }
        };
        let target = target.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        self.load_until(target)?;
        self.position = target;
        Ok(target)
    }
}

/// How [`crate::Path::open_mode`] should expose the opened resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    Binary,
    Text,
}

/// A binary file opened from a [`crate::Path`].
///
/// Dropping the file (or calling [`PathFile::close`]) releases the
/// underlying transport stream.
pub struct PathFile {
    location: String,
    inner: StreamBuffer<Chunks<ByteStream>>,
}

impl PathFile {
    pub(crate) fn new(location: String, stream: ByteStream) -> Self {
        Self {
            location,
            inner: StreamBuffer::new(Chunks::new(stream)),
        }
    }

    /// Read up to `size` bytes, or the rest of the file for `None`.
    pub fn read_chunk(&mut self, size: Option<usize>) -> Result<Vec<u8>> {
        Ok(self.inner.read_chunk(size)?)
    }

    pub fn tell(&self) -> u64 {
        self.inner.tell()
    }

    /// Display form of the path this file was opened from.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn close(self) {}
}

impl Read for PathFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for PathFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// A text file opened from a [`crate::Path`]; positions are byte offsets.
pub struct TextFile {
    file: PathFile,
}

impl TextFile {
    pub(crate) fn new(file: PathFile) -> Self {
        Self { file }
    }

    /// Read about `size` bytes as text, or the rest of the file for `None`.
    ///
    /// A read that stops inside a multi-byte character is extended until the
    /// character is complete, so every chunk decodes on its own.
    pub fn read(&mut self, size: Option<usize>) -> Result<String> {
        let mut bytes = self.file.read_chunk(size)?;
        if size.is_some() {
            // A UTF-8 sequence is at most four bytes long.
            for _ in 0..3 {
                match std::str::from_utf8(&bytes) {
                    Err(e) if e.error_len().is_none() => {
                        let more = self.file.read_chunk(Some(1))?;
                        if more.is_empty() {
                            break;
                        }
                        bytes.extend_from_slice(&more);
                    }
                    _ => break,
                }
            }
        }

        String::from_utf8(bytes).map_err(|source| Error::Utf8 {
            path: self.file.location.clone(),
            source,
        })
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.file.seek(pos)?)
    }

    pub fn tell(&self) -> u64 {
        self.file.tell()
    }

    pub fn location(&self) -> &str {
        self.file.location()
    }

    pub fn close(self) {}
}

/// One read from an [`OpenFile`]: bytes in binary mode, text in text mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Bytes(Vec<u8>),
    Text(String),
}

impl Chunk {
    pub fn is_empty(&self) -> bool {
        match self {
            Chunk::Bytes(bytes) => bytes.is_empty(),
            Chunk::Text(text) => text.is_empty(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Chunk::Bytes(bytes) => bytes,
            Chunk::Text(text) => text.as_bytes(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Chunk::Bytes(bytes) => bytes,
            Chunk::Text(text) => text.into_bytes(),
        }
    }
}

/// Either flavour of opened file, as chosen by [`OpenMode`].
pub enum OpenFile {
    Binary(PathFile),
    Text(TextFile),
}

impl OpenFile {
    pub fn mode(&self) -> OpenMode {
        match self {
            OpenFile::Binary(_) => OpenMode::Binary,
            OpenFile::Text(_) => OpenMode::Text,
        }
    }

    /// Read up to `size` bytes, or the rest for `None`, in the file's mode.
    pub fn read(&mut self, size: Option<usize>) -> Result<Chunk> {
        match self {
            OpenFile::Binary(file) => file.read_chunk(size).map(Chunk::Bytes),
            OpenFile::Text(file) => file.read(size).map(Chunk::Text),
        }
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        match self {
            OpenFile::Binary(file) => Ok(file.seek(pos)?),
            OpenFile::Text(file) => file.seek(pos),
        }
    }

    pub fn tell(&self) -> u64 {
        match self {
            OpenFile::Binary(file) => file.tell(),
            OpenFile::Text(file) => file.tell(),
        }
    }

    pub fn into_binary(self) -> Option<PathFile> {
        match self {
            OpenFile::Binary(file) => Some(file),
            OpenFile::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Option<TextFile> {
        match self {
            OpenFile::Text(file) => Some(file),
            OpenFile::Binary(_) => None,
        }
    }

    pub fn close(self) {}
}
