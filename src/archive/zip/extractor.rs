use std::io::Read;

use flate2::read::DeflateDecoder;
use flate2::Crc;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};
use crate::error::{Error, Result};

/// Member lookup and extraction on top of [`ZipParser`].
pub struct ZipExtractor<'a> {
    parser: ZipParser<'a>,
}

impl<'a> ZipExtractor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            parser: ZipParser::new(data),
        }
    }

    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Decompress `entry` and check its CRC-32.
    pub fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted {
            return Err(Error::malformed_archive(
                "zip",
                format!("{} is encrypted", entry.file_name),
            ));
        }

        let data_offset = self.parser.data_offset(entry)?;
        let compressed_size = usize::try_from(entry.compressed_size)
            .map_err(|_| Error::malformed_archive("zip", "member too large"))?;
        let raw = self.parser.slice(data_offset, compressed_size)?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflate => {
                let capacity = usize::try_from(entry.uncompressed_size).unwrap_or(0);
                let mut out = Vec::with_capacity(capacity.min(raw.len().saturating_mul(16)));
                DeflateDecoder::new(raw)
                    .read_to_end(&mut out)
                    .map_err(|e| {
                        Error::malformed_archive("zip", format!("{}: {e}", entry.file_name))
                    })?;
                out
            }
            CompressionMethod::Unknown(method) => {
                return Err(Error::malformed_archive(
                    "zip",
                    format!("{}: unsupported compression method {method}", entry.file_name),
                ));
            }
        };

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(Error::malformed_archive(
                "zip",
                format!("{}: crc mismatch", entry.file_name),
            ));
        }

        Ok(data)
    }
}
