//! Tar containers, optionally gzip-compressed.
//!
//! Understands ustar headers (name + prefix), GNU long names (`L`) and PAX
//! extended headers (`x`, `path=` only). Sizes may be octal or GNU base-256.

use std::io::{Cursor, Read};

use flate2::read::MultiGzDecoder;

use super::{ArchiveFormat, normalize_member};
use crate::error::{Error, Result};
use crate::stream::ByteStream;

const BLOCK: usize = 512;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

const NAME: std::ops::Range<usize> = 0..100;
const SIZE: std::ops::Range<usize> = 124..136;
const TYPEFLAG: usize = 156;
const MAGIC: std::ops::Range<usize> = 257..263;
const PREFIX: std::ops::Range<usize> = 345..500;

/// `.tar.gz`, `.tgz` and `.tar`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarFormat;

/// One header and its payload, borrowed from the archive bytes.
#[derive(Debug, Clone)]
pub struct TarEntry<'a> {
    pub name: String,
    pub typeflag: u8,
    pub data: &'a [u8],
}

impl TarEntry<'_> {
    pub fn is_regular_file(&self) -> bool {
        matches!(self.typeflag, 0 | b'0' | b'7')
    }
}

impl ArchiveFormat for TarFormat {
    fn name(&self) -> &'static str {
        "tar"
    }

    fn label(&self) -> &'static str {
        "TarArchive"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".tar.gz", ".tgz", ".tar"]
    }

    fn open_member(&self, data: Vec<u8>, member: &str) -> Result<ByteStream> {
        let data = decompress(data)?;
        let wanted = normalize_member(member);
        let entry = entries(&data)?
            .into_iter()
            .rev()
            .find(|entry| normalize_member(&entry.name) == wanted)
            .ok_or_else(|| Error::not_accessible(member))?;
        if !entry.is_regular_file() {
            return Err(Error::not_accessible_because(member, "not a regular file"));
        }
        Ok(Box::new(Cursor::new(entry.data.to_vec())))
    }
}

/// Inflate gzip input; anything else is returned untouched.
fn decompress(data: Vec<u8>) -> Result<Vec<u8>> {
    if !data.starts_with(&GZIP_MAGIC) {
        return Ok(data);
    }
    let mut out = Vec::with_capacity(data.len() * 4);
    MultiGzDecoder::new(data.as_slice())
        .read_to_end(&mut out)
        .map_err(|e| Error::malformed_archive("tar", format!("gzip: {e}")))?;
    Ok(out)
}

/// Walk every header in `data`. Later entries with the same name win when
/// looking up members, matching how `tar -x` overwrites.
pub fn entries(data: &[u8]) -> Result<Vec<TarEntry<'_>>> {
    let mut out = Vec::new();
    let mut offset = 0;
    let mut zero_blocks = 0;
    let mut long_name: Option<String> = None;
    let mut pax_path: Option<String> = None;

    while offset + BLOCK <= data.len() {
        let header = &data[offset..offset + BLOCK];
        offset += BLOCK;

        if header.iter().all(|&b| b == 0) {
            zero_blocks += 1;
            if zero_blocks == 2 {
                break;
            }
            continue;
        }
        zero_blocks = 0;

        let size = parse_size(&header[SIZE])
            .ok_or_else(|| Error::malformed_archive("tar", "bad size field"))?;
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| Error::malformed_archive("tar", "entry runs past end of archive"))?;
        let payload = &data[offset..end];
        offset = end + pad(size);

        match header[TYPEFLAG] {
            b'L' => long_name = Some(c_string(payload)),
            b'x' => pax_path = pax_record(payload, "path"),
            // Global PAX headers and GNU long link targets name no member.
            b'g' | b'K' => {}
            typeflag => {
                let name = pax_path
                    .take()
                    .or_else(|| long_name.take())
                    .unwrap_or_else(|| ustar_name(header));
                out.push(TarEntry {
                    name,
                    typeflag,
                    data: payload,
                });
            }
        }
    }

    Ok(out)
}

fn pad(size: usize) -> usize {
    (BLOCK - size % BLOCK) % BLOCK
}

fn c_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn ustar_name(header: &[u8]) -> String {
    let name = c_string(&header[NAME]);
    let is_ustar = header[MAGIC].starts_with(b"ustar");
    let prefix = if is_ustar {
        c_string(&header[PREFIX])
    } else {
        String::new()
    };
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}

/// Octal (NUL/space terminated) or GNU base-256 when the high bit is set.
fn parse_size(field: &[u8]) -> Option<usize> {
    if field.first().is_some_and(|b| b & 0x80 != 0) {
        let mut value: u64 = u64::from(field[0] & 0x7f);
        for &b in &field[1..] {
            value = value.checked_mul(256)?.checked_add(u64::from(b))?;
        }
        return usize::try_from(value).ok();
    }

    let digits: Vec<u8> = field
        .iter()
        .copied()
        .skip_while(|&b| b == b' ')
        .take_while(|&b| (b'0'..=b'7').contains(&b))
        .collect();
    if digits.is_empty() {
        return Some(0);
    }
    let text = std::str::from_utf8(&digits).ok()?;
    usize::from_str_radix(text, 8).ok()
}

/// Value of `key` in a PAX extended header (`"<len> key=value\n"` records).
fn pax_record(payload: &[u8], key: &str) -> Option<String> {
    let text = String::from_utf8_lossy(payload);
    let mut found = None;
    for record in text.split_terminator('\n') {
        let Some((_, kv)) = record.split_once(' ') else {
            continue;
        };
        if let Some((k, v)) = kv.split_once('=')
            && k == key
        {
            found = Some(v.to_string());
        }
    }
    found
}
