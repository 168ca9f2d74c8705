//! Core book data types shared by sources, the renderer and the navigator.

use std::fmt;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies the content a navigator should load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BookReference {
    /// A remote locator such as `https://www.gutenberg.org/...epub`
    Remote(String),
    /// A local EPUB file
    Local(PathBuf),
    /// No reference; the built-in default book is loaded
    #[default]
    None,
}

impl BookReference {
    /// Classify an optional caller-supplied string.
    ///
    /// Strings carrying a `scheme://` prefix are remote locators, except
    /// `file://` which is unwrapped into a local path. Anything else is a
    /// local path. Empty strings count as no reference.
    pub fn parse(reference: Option<&str>) -> Self {
        let Some(raw) = reference.map(str::trim) else {
            return BookReference::None;
        };
        if raw.is_empty() {
            return BookReference::None;
        }
        if let Some(path) = raw.strip_prefix("file://") {
            return BookReference::Local(PathBuf::from(path));
        }
        match raw.split_once("://") {
            Some((scheme, _))
                if !scheme.is_empty()
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
            {
                BookReference::Remote(raw.to_string())
            }
            _ => BookReference::Local(PathBuf::from(raw)),
        }
    }

    /// Whether a reference was supplied at all.
    pub fn is_some(&self) -> bool {
        !matches!(self, BookReference::None)
    }

    /// Remote URL, if this is a remote reference.
    pub fn as_url(&self) -> Option<&str> {
        match self {
            BookReference::Remote(url) => Some(url.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for BookReference {
    fn from(value: &str) -> Self {
        BookReference::parse(Some(value))
    }
}

impl From<Option<&str>> for BookReference {
    fn from(value: Option<&str>) -> Self {
        BookReference::parse(value)
    }
}

impl fmt::Display for BookReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookReference::Remote(url) => f.write_str(url),
            BookReference::Local(path) => write!(f, "{}", path.display()),
            BookReference::None => f.write_str("<none>"),
        }
    }
}

/// One chapter in reading order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Chapter {
    /// Identifier, unique within the book
    pub id: String,
    /// Display title
    pub title: String,
    /// Body markup (an HTML fragment)
    pub content: String,
}

impl Chapter {
    /// Create a chapter.
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Whole-book metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BookMetadata {
    /// Book title
    pub title: String,
    /// Author name
    pub author: String,
    /// Language code (e.g. "en")
    pub language: String,
    /// Where the content came from, or a short description
    pub source: String,
    /// Publisher (dc:publisher)
    pub publisher: Option<String>,
    /// Unique identifier (dc:identifier)
    pub identifier: Option<String>,
    /// Publication date (dc:date)
    pub date: Option<String>,
    /// Blurb (dc:description)
    pub description: Option<String>,
}

impl BookMetadata {
    /// Metadata with only the four core fields set.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        language: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            language: language.into(),
            source: source.into(),
            publisher: None,
            identifier: None,
            date: None,
            description: None,
        }
    }
}

/// Which resolution path populated a navigator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LoadOrigin {
    /// Matched the table of known online books
    Catalog,
    /// Parsed from an EPUB container
    Container,
    /// Fell back to the built-in default book
    BuiltIn,
}

impl LoadOrigin {
    /// Only catalog matches count as online books.
    pub fn is_online(self) -> bool {
        matches!(self, LoadOrigin::Catalog)
    }
}

impl fmt::Display for LoadOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadOrigin::Catalog => "catalog",
            LoadOrigin::Container => "container",
            LoadOrigin::BuiltIn => "built-in",
        })
    }
}

/// A book produced by a source: metadata plus ordered chapters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedBook {
    /// Whole-book metadata
    pub metadata: BookMetadata,
    /// Chapters in reading order
    pub chapters: Vec<Chapter>,
    /// Path that produced the book
    pub origin: LoadOrigin,
}

/// Content statistics carried by a catalog descriptor.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ContentStats {
    /// Approximate chapter count advertised by the catalog
    pub chapters: u32,
    /// Whether the book carries illustrations
    pub has_images: bool,
    /// Approximate word count
    pub word_count: u32,
}

/// Book descriptor handed over by a catalog or reading screen.
///
/// Only `book_url` reaches the navigator; the remaining fields are display
/// concerns of the caller.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct BookDescriptor {
    /// Locator of the EPUB
    pub book_url: Option<String>,
    /// Display title
    pub title: String,
    /// Display author
    pub author: String,
    /// Cover image URL
    pub cover: Option<String>,
    /// Page count
    pub pages: u32,
    /// Average rating
    pub rating: f32,
    /// Catalog category
    pub category: Option<String>,
    /// Blurb
    pub description: Option<String>,
    /// Publication year
    pub published: Option<i32>,
    /// Content statistics
    pub content: ContentStats,
}

impl BookDescriptor {
    /// Reference the navigator should load for this descriptor.
    pub fn reference(&self) -> BookReference {
        BookReference::parse(self.book_url.as_deref())
    }
}
