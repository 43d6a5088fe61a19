//! ZIP containers (`.zip`, `.dep`).
//!
//! The whole archive is in memory, so parsing works on a byte slice: the End
//! of Central Directory is found from the tail (with or without a comment,
//! ZIP64 included), the Central Directory gives every member's sizes and
//! Local File Header offset, and the member is inflated from there.
//!
//! Supported: STORED and DEFLATE, ZIP64. Not supported: encryption,
//! multi-disk archives, other compression methods.

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::{CompressionMethod, ZipFileEntry};

use std::io::{self, Cursor};

use super::{ArchiveFormat, normalize_member};
use crate::error::{Error, Result};
use crate::stream::ByteStream;

/// `.zip` and `.dep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipFormat;

impl ArchiveFormat for ZipFormat {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn label(&self) -> &'static str {
        "ZipArchive"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".zip", ".dep"]
    }

    fn open_member(&self, data: Vec<u8>, member: &str) -> Result<ByteStream> {
        let extractor = ZipExtractor::new(&data);
        let wanted = normalize_member(member);
        let entry = extractor
            .list_files()?
            .into_iter()
            .find(|entry| normalize_member(&entry.file_name) == wanted)
            .ok_or_else(|| Error::not_accessible(member))?;
        if entry.is_directory {
            return Err(Error::not_accessible_because(member, "is a directory"));
        }

        let content = extractor.extract_to_memory(&entry)?;
        Ok(Box::new(Cursor::new(content)))
    }
}

pub(super) fn truncated(_: io::Error) -> Error {
    Error::malformed_archive("zip", "truncated structure")
}
