//! ZIP container reader for EPUB archives
//!
//! Parses the central directory once and caches it in a fixed-capacity
//! table, then reads individual entries on demand. Supports stored and
//! DEFLATE entries (via miniz_oxide) and verifies CRC32 checksums.

use heapless::Vec as HeaplessVec;
use std::io::{Read, Seek, SeekFrom};

pub use crate::error::ZipError;

/// Maximum number of central directory entries kept in memory
pub const MAX_ENTRIES: usize = 512;

const SIG_LOCAL_FILE_HEADER: u32 = 0x04034b50;
const SIG_CD_ENTRY: u32 = 0x02014b50;
const SIG_EOCD: u32 = 0x06054b50;
const SIG_ZIP64_EOCD_LOCATOR: u32 = 0x07064b50;

const EOCD_MIN_SIZE: usize = 22;
const MAX_EOCD_SCAN: usize = EOCD_MIN_SIZE + u16::MAX as usize;
const LOCAL_HEADER_SIZE: u64 = 30;
const CD_FIXED_SIZE: usize = 42;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

const EPUB_MIMETYPE: &str = "application/epub+zip";

/// Size limits applied while reading entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZipLimits {
    /// Largest compressed or uncompressed entry size accepted.
    pub max_entry_size: usize,
    /// Largest accepted `mimetype` entry.
    pub max_mimetype_size: usize,
    /// Reject archives whose central directory does not fit the cache.
    pub strict: bool,
}

impl ZipLimits {
    /// Create explicit limits.
    pub fn new(max_entry_size: usize, max_mimetype_size: usize) -> Self {
        Self {
            max_entry_size,
            max_mimetype_size,
            strict: false,
        }
    }

    /// Enable or disable strict central directory handling.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl Default for ZipLimits {
    fn default() -> Self {
        Self::new(16 * 1024 * 1024, 1024)
    }
}

/// Central directory record for one archive member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    /// Path inside the archive
    pub name: String,
    /// Compression method (0 = stored, 8 = deflated)
    pub method: u16,
    /// CRC32 of the uncompressed data
    pub crc32: u32,
    /// Compressed size in bytes
    pub compressed_size: u32,
    /// Uncompressed size in bytes
    pub uncompressed_size: u32,
    /// Offset of the local file header
    pub local_header_offset: u32,
}

struct DirectoryLocation {
    offset: u64,
    size: u64,
    entries: u16,
}

/// Random-access reader over a ZIP archive
pub struct ZipArchive<R: Read + Seek> {
    reader: R,
    entries: HeaplessVec<ZipEntry, MAX_ENTRIES>,
    limits: ZipLimits,
}

impl<R: Read + Seek> ZipArchive<R> {
    /// Open an archive with default limits.
    pub fn open(reader: R) -> Result<Self, ZipError> {
        Self::open_with_limits(reader, ZipLimits::default())
    }

    /// Open an archive and parse its central directory.
    pub fn open_with_limits(mut reader: R, limits: ZipLimits) -> Result<Self, ZipError> {
        let location = locate_directory(&mut reader)?;
        if limits.strict && location.entries as usize > MAX_ENTRIES {
            return Err(ZipError::CentralDirFull);
        }

        reader
            .seek(SeekFrom::Start(location.offset))
            .map_err(|_| ZipError::IoError)?;

        let directory_end = location.offset + location.size;
        let mut entries = HeaplessVec::new();
        for _ in 0..location.entries {
            let pos = reader.stream_position().map_err(|_| ZipError::IoError)?;
            if pos >= directory_end {
                break;
            }
            let Some(entry) = read_directory_entry(&mut reader)? else {
                break;
            };
            if entries.push(entry).is_err() {
                log::warn!(
                    "[ZIP] central directory lists {} entries, keeping the first {}",
                    location.entries,
                    MAX_ENTRIES
                );
                break;
            }
        }

        log::debug!(
            "[ZIP] loaded {} central directory entries at offset {}",
            entries.len(),
            location.offset
        );

        Ok(Self {
            reader,
            entries,
            limits,
        })
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no cached entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over cached entries in directory order.
    pub fn entries(&self) -> impl Iterator<Item = &ZipEntry> {
        self.entries.iter()
    }

    /// Look up an entry by path, ignoring ASCII case and a leading `/`.
    pub fn entry(&self, name: &str) -> Option<&ZipEntry> {
        let wanted = name.trim_start_matches('/');
        self.entries
            .iter()
            .find(|e| e.name.trim_start_matches('/').eq_ignore_ascii_case(wanted))
    }

    /// Read and decompress an entry by path.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, ZipError> {
        let entry = self.entry(name).cloned().ok_or(ZipError::FileNotFound)?;
        self.read_entry(&entry)
    }

    /// Read and decompress a specific entry.
    pub fn read_entry(&mut self, entry: &ZipEntry) -> Result<Vec<u8>, ZipError> {
        let max = self.limits.max_entry_size;
        if entry.uncompressed_size as usize > max || entry.compressed_size as usize > max {
            return Err(ZipError::FileTooLarge);
        }

        let data_offset = self.data_offset(entry)?;
        self.reader
            .seek(SeekFrom::Start(data_offset))
            .map_err(|_| ZipError::IoError)?;
        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.reader
            .read_exact(&mut raw)
            .map_err(|_| ZipError::IoError)?;

        let data = match entry.method {
            METHOD_STORED => raw,
            METHOD_DEFLATED => miniz_oxide::inflate::decompress_to_vec_with_limit(&raw, max)
                .map_err(|_| ZipError::DecompressError)?,
            _ => return Err(ZipError::UnsupportedCompression),
        };

        if entry.crc32 != 0 && crc32fast::hash(&data) != entry.crc32 {
            return Err(ZipError::CrcMismatch);
        }
        Ok(data)
    }

    /// Check that `mimetype` exists and reads `application/epub+zip`.
    pub fn validate_mimetype(&mut self) -> Result<(), ZipError> {
        let entry = self
            .entry("mimetype")
            .cloned()
            .ok_or_else(|| ZipError::InvalidMimetype("mimetype file not found".to_string()))?;
        if entry.uncompressed_size as usize > self.limits.max_mimetype_size {
            return Err(ZipError::InvalidMimetype(
                "mimetype file too large".to_string(),
            ));
        }

        let bytes = self.read_entry(&entry)?;
        let content = std::str::from_utf8(&bytes).map_err(|_| {
            ZipError::InvalidMimetype("mimetype file is not valid UTF-8".to_string())
        })?;
        if content.trim() != EPUB_MIMETYPE {
            return Err(ZipError::InvalidMimetype(format!(
                "expected '{}', got '{}'",
                EPUB_MIMETYPE, content
            )));
        }
        Ok(())
    }

    fn data_offset(&mut self, entry: &ZipEntry) -> Result<u64, ZipError> {
        let offset = entry.local_header_offset as u64;
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|_| ZipError::IoError)?;
        let mut header = [0u8; LOCAL_HEADER_SIZE as usize];
        self.reader
            .read_exact(&mut header)
            .map_err(|_| ZipError::IoError)?;
        if le_u32(&header, 0) != SIG_LOCAL_FILE_HEADER {
            return Err(ZipError::InvalidFormat);
        }
        let name_len = le_u16(&header, 26) as u64;
        let extra_len = le_u16(&header, 28) as u64;
        Ok(offset + LOCAL_HEADER_SIZE + name_len + extra_len)
    }
}

fn locate_directory<R: Read + Seek>(reader: &mut R) -> Result<DirectoryLocation, ZipError> {
    let file_size = reader.seek(SeekFrom::End(0)).map_err(|_| ZipError::IoError)?;
    if file_size < EOCD_MIN_SIZE as u64 {
        return Err(ZipError::InvalidFormat);
    }

    let scan = file_size.min(MAX_EOCD_SCAN as u64) as usize;
    let tail_start = file_size - scan as u64;
    reader
        .seek(SeekFrom::Start(tail_start))
        .map_err(|_| ZipError::IoError)?;
    let mut tail = vec![0u8; scan];
    reader
        .read_exact(&mut tail)
        .map_err(|_| ZipError::IoError)?;

    for i in (0..=scan - EOCD_MIN_SIZE).rev() {
        if le_u32(&tail, i) != SIG_EOCD {
            continue;
        }
        // A valid record ends exactly at EOF once its comment is counted.
        let comment_len = le_u16(&tail, i + 20) as usize;
        if i + EOCD_MIN_SIZE + comment_len != scan {
            continue;
        }

        let entries = le_u16(&tail, i + 10);
        let size = le_u32(&tail, i + 12);
        let offset = le_u32(&tail, i + 16);
        if entries == u16::MAX || size == u32::MAX || offset == u32::MAX {
            return Err(ZipError::UnsupportedZip64);
        }
        if i >= 20 && le_u32(&tail, i - 20) == SIG_ZIP64_EOCD_LOCATOR {
            return Err(ZipError::UnsupportedZip64);
        }

        let eocd_pos = tail_start + i as u64;
        let end = offset as u64 + size as u64;
        if end > eocd_pos {
            return Err(ZipError::InvalidFormat);
        }
        return Ok(DirectoryLocation {
            offset: offset as u64,
            size: size as u64,
            entries,
        });
    }

    Err(ZipError::InvalidFormat)
}

fn read_directory_entry<R: Read + Seek>(reader: &mut R) -> Result<Option<ZipEntry>, ZipError> {
    let mut sig = [0u8; 4];
    if reader.read_exact(&mut sig).is_err() || u32::from_le_bytes(sig) != SIG_CD_ENTRY {
        return Ok(None);
    }

    // Offsets below are relative to the end of the 4-byte signature.
    let mut fixed = [0u8; CD_FIXED_SIZE];
    reader
        .read_exact(&mut fixed)
        .map_err(|_| ZipError::IoError)?;
    let name_len = le_u16(&fixed, 24) as usize;
    let extra_len = le_u16(&fixed, 26) as i64;
    let comment_len = le_u16(&fixed, 28) as i64;

    let mut name = vec![0u8; name_len];
    reader
        .read_exact(&mut name)
        .map_err(|_| ZipError::IoError)?;
    reader
        .seek(SeekFrom::Current(extra_len + comment_len))
        .map_err(|_| ZipError::IoError)?;

    Ok(Some(ZipEntry {
        name: String::from_utf8_lossy(&name).into_owned(),
        method: le_u16(&fixed, 6),
        crc32: le_u32(&fixed, 12),
        compressed_size: le_u32(&fixed, 16),
        uncompressed_size: le_u32(&fixed, 20),
        local_header_offset: le_u32(&fixed, 38),
    }))
}

fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
