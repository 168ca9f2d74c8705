//! Error types for chapter_nav
//!
//! `NavigatorError` covers the caller-facing failures of the cursor API.
//! `EpubError` and `ZipError` come from the container reader and never
//! reach navigator callers directly: they are absorbed into a fallback
//! and reported through the `Error` event as a `ResolveFailure`.

use std::fmt;

/// Errors returned by `ChapterNavigator` operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavigatorError {
    /// An accessor or navigation method was called before `init` completed
    Uninitialized,
    /// `chapter_content` was asked for an index outside the chapter list
    ChapterOutOfRange {
        /// Index that was asked for
        index: usize,
        /// Chapters in the loaded book
        chapter_count: usize,
    },
    /// `go_to_chapter` was asked to jump outside the chapter list
    InvalidIndex {
        /// Jump target
        index: usize,
        /// Chapters in the loaded book
        chapter_count: usize,
    },
    /// `go_to_chapter_id` was given an id that no chapter carries
    UnknownChapter {
        /// Requested chapter id.
        id: String,
    },
}

impl fmt::Display for NavigatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigatorError::Uninitialized => {
                write!(f, "navigator is not initialized; await init() first")
            }
            NavigatorError::ChapterOutOfRange {
                index,
                chapter_count,
            } => write!(
                f,
                "Chapter index {} out of range (chapter count: {})",
                index, chapter_count
            ),
            NavigatorError::InvalidIndex {
                index,
                chapter_count,
            } => write!(
                f,
                "Invalid chapter index {} (chapter count: {})",
                index, chapter_count
            ),
            NavigatorError::UnknownChapter { id } => write!(f, "Unknown chapter id '{}'", id),
        }
    }
}

impl std::error::Error for NavigatorError {}

/// Errors raised while reading an EPUB container
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EpubError {
    /// The archive itself could not be read
    Zip(ZipError),
    /// Malformed container, package or chapter markup
    Parse(String),
    /// Well-formed XML that does not describe a usable publication
    InvalidEpub(String),
    /// Reading the file failed; holds the rendered `io::Error`
    Io(String),
    /// A spine `itemref` names no manifest item
    ManifestItemMissing {
        /// The dangling `idref`
        idref: String,
    },
    /// A chapter document is not UTF-8
    ChapterNotUtf8 {
        /// Archive path of the chapter
        href: String,
    },
    /// The package resolved to no readable chapters
    EmptySpine,
    /// Two chapters share an id
    DuplicateChapterId {
        /// The repeated id
        id: String,
    },
}

impl fmt::Display for EpubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpubError::Zip(kind) => write!(f, "archive: {}", kind),
            EpubError::Parse(msg) => write!(f, "markup: {}", msg),
            EpubError::InvalidEpub(msg) => write!(f, "not a usable EPUB: {}", msg),
            EpubError::Io(msg) => write!(f, "read failed: {}", msg),
            EpubError::ManifestItemMissing { idref } => {
                write!(f, "spine refers to unknown manifest item '{}'", idref)
            }
            EpubError::ChapterNotUtf8 { href } => write!(f, "{} is not UTF-8", href),
            EpubError::EmptySpine => write!(f, "no readable chapters in spine"),
            EpubError::DuplicateChapterId { id } => write!(f, "chapter id '{}' is not unique", id),
        }
    }
}

impl std::error::Error for EpubError {}

impl From<ZipError> for EpubError {
    fn from(err: ZipError) -> Self {
        EpubError::Zip(err)
    }
}

impl From<std::io::Error> for EpubError {
    fn from(err: std::io::Error) -> Self {
        EpubError::Io(err.to_string())
    }
}

impl From<quick_xml::Error> for EpubError {
    fn from(err: quick_xml::Error) -> Self {
        EpubError::Parse(format!("XML parse error: {:?}", err))
    }
}

/// Failures of the archive layer
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ZipError {
    /// No entry with the requested path
    FileNotFound,
    /// Missing or inconsistent ZIP records
    InvalidFormat,
    /// Entry uses a method other than stored or DEFLATE
    UnsupportedCompression,
    /// DEFLATE stream is corrupt or exceeds the size limit
    DecompressError,
    /// Decompressed bytes do not match the recorded CRC32
    CrcMismatch,
    /// The underlying reader failed
    IoError,
    /// Central directory has more entries than the reader caches
    CentralDirFull,
    /// Entry exceeds the configured size limit
    FileTooLarge,
    /// `mimetype` entry is absent or not `application/epub+zip`
    InvalidMimetype(String),
    /// Archive needs ZIP64 records
    UnsupportedZip64,
}

impl fmt::Display for ZipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZipError::FileNotFound => write!(f, "entry not found"),
            ZipError::InvalidFormat => write!(f, "not a ZIP archive"),
            ZipError::UnsupportedCompression => write!(f, "compression method not supported"),
            ZipError::DecompressError => write!(f, "inflate failed"),
            ZipError::CrcMismatch => write!(f, "checksum mismatch"),
            ZipError::IoError => write!(f, "read error"),
            ZipError::CentralDirFull => write!(f, "too many entries"),
            ZipError::FileTooLarge => write!(f, "entry exceeds size limit"),
            ZipError::InvalidMimetype(msg) => write!(f, "bad mimetype: {}", msg),
            ZipError::UnsupportedZip64 => write!(f, "ZIP64 archives are not supported"),
        }
    }
}

impl std::error::Error for ZipError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigator_error_display_mentions_bounds() {
        let err = NavigatorError::InvalidIndex {
            index: 7,
            chapter_count: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains('7'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_uninitialized_display() {
        let msg = NavigatorError::Uninitialized.to_string();
        assert!(msg.contains("not initialized"));
    }

    #[test]
    fn test_zip_error_converts_into_epub_error() {
        let err: EpubError = ZipError::CrcMismatch.into();
        assert_eq!(err, EpubError::Zip(ZipError::CrcMismatch));
        assert_eq!(err.to_string(), "archive: checksum mismatch");
    }

    #[test]
    fn test_io_error_keeps_description() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: EpubError = io.into();
        assert!(matches!(err, EpubError::Io(ref msg) if msg.contains("no such file")));
    }
}
