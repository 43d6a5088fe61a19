//! Low-level ZIP structure parsing over an in-memory archive.
//!
//! ZIP files are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the tail
//! 2. If ZIP64, follow the locator to the ZIP64 EOCD
//! 3. Parse the Central Directory for every member's metadata
//! 4. For extraction, skip the member's Local File Header to its data

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use super::structures::*;
use super::truncated;
use crate::error::{Error, Result};

/// Maximum ZIP comment size allowed by the format.
const MAX_COMMENT_SIZE: usize = 65535;

/// Parser over the complete bytes of one archive.
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Locate the EOCD record, returning it with its offset.
    ///
    /// Tries the common no-comment position first, then scans backwards
    /// through the largest possible comment.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, usize)> {
        let size = self.data.len();
        if size >= EndOfCentralDirectory::SIZE {
            let offset = size - EndOfCentralDirectory::SIZE;
            let buf = &self.data[offset..];
            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && buf[20..22] == [0, 0] {
                return Ok((EndOfCentralDirectory::from_bytes(buf)?, offset));
            }
        }

        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE).min(size);
        let search_start = size - search_size;
        let buf = &self.data[search_start..];

        for i in (0..=buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if buf.len() < i + EndOfCentralDirectory::SIZE {
                continue;
            }
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment must run exactly to the end of the file.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(&buf[i..])?;
                    return Ok((eocd, search_start + i));
                }
            }
        }

        Err(Error::malformed_archive("zip", "end of central directory not found"))
    }

    /// Read the ZIP64 EOCD through the locator preceding the regular EOCD.
    pub fn read_zip64_eocd(&self, eocd_offset: usize) -> Result<Zip64Eocd> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EocdLocator::SIZE)
            .ok_or_else(|| Error::malformed_archive("zip", "missing zip64 locator"))?;
        let locator = Zip64EocdLocator::from_bytes(&self.data[locator_offset..eocd_offset])?;

        let start = to_usize(locator.eocd64_offset)?;
        Zip64Eocd::from_bytes(self.slice(start, Zip64Eocd::MIN_SIZE)?)
    }

    /// Every central directory entry, in archive order.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                u64::from(eocd.cd_offset),
                u64::from(eocd.cd_size),
                u64::from(eocd.total_entries),
            )
        };

        let cd_data = self.slice(to_usize(cd_offset)?, to_usize(cd_size)?)?;
        let mut cursor = Cursor::new(cd_data);
        // Each header is at least 46 bytes, so a bogus count cannot
        // over-allocate.
        let capacity = to_usize(total_entries)?.min(cd_data.len() / 46);
        let mut entries = Vec::with_capacity(capacity);
        for _ in 0..total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Offset of the member's data: LFH + name + extra field.
    ///
    /// The local lengths can differ from the central directory copy, so the
    /// LFH itself is consulted.
    pub fn data_offset(&self, entry: &ZipFileEntry) -> Result<usize> {
        let lfh_offset = to_usize(entry.lfh_offset)?;
        let lfh = self.slice(lfh_offset, LFH_SIZE)?;
        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(Error::malformed_archive("zip", "bad local file header"));
        }

        let file_name_length = usize::from(u16::from_le_bytes([lfh[26], lfh[27]]));
        let extra_field_length = usize::from(u16::from_le_bytes([lfh[28], lfh[29]]));
        Ok(lfh_offset + LFH_SIZE + file_name_length + extra_field_length)
    }

    /// `len` bytes at `start`, or `MalformedArchive` when out of range.
    pub fn slice(&self, start: usize, len: usize) -> Result<&'a [u8]> {
        start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| Error::malformed_archive("zip", "structure points past end of archive"))
    }
}

fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig).map_err(truncated)?;
    if sig != CDFH_SIGNATURE {
        return Err(Error::malformed_archive("zip", "bad central directory header"));
    }

    let mut u16_field = || cursor.read_u16::<LittleEndian>().map_err(truncated);
    let _version_made_by = u16_field()?;
    let _version_needed = u16_field()?;
    let flags = u16_field()?;
    let compression_method = u16_field()?;
    let _last_mod_time = u16_field()?;
    let _last_mod_date = u16_field()?;

    let crc32 = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    let mut compressed_size = u64::from(cursor.read_u32::<LittleEndian>().map_err(truncated)?);
    let mut uncompressed_size = u64::from(cursor.read_u32::<LittleEndian>().map_err(truncated)?);
    let file_name_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let file_comment_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let _external_attrs = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    let mut lfh_offset = u64::from(cursor.read_u32::<LittleEndian>().map_err(truncated)?);

    let mut file_name_bytes = vec![0u8; usize::from(file_name_length)];
    cursor.read_exact(&mut file_name_bytes).map_err(truncated)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();
    let is_directory = file_name.ends_with('/');

    // ZIP64 extended information (0x0001) only carries the fields whose
    // header value is saturated.
    let extra_field_end = cursor.position() + u64::from(extra_field_length);
    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let field_size = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let field_end = cursor.position() + u64::from(field_size);

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            }
        }
        cursor.set_position(field_end);
    }

    cursor.set_position(extra_field_end + u64::from(file_comment_length));

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        is_directory,
        is_encrypted: flags & 0x0001 != 0,
    })
}

fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::malformed_archive("zip", "offset does not fit in memory"))
}
