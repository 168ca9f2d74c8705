//! Book sources: strategies that turn a `BookReference` into a book.
//!
//! The navigator asks each source in turn. A source either recognizes the
//! reference and produces a book, declines it, or recognizes it and fails
//! while reading it. Only the first outcome stops the search.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;

use crate::book::{BookMetadata, BookReference, Chapter, LoadOrigin, ResolvedBook};
use crate::catalog;
use crate::error::EpubError;
use crate::opf::{self, Package};
use crate::xhtml;
use crate::zip::{ZipArchive, ZipLimits};

/// Outcome of asking one source about a reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The source produced a book
    Recognized(ResolvedBook),
    /// The reference is not something this source handles
    Unrecognized,
    /// The source handles the reference but could not read it
    ParseFailed(EpubError),
}

/// A resolution strategy.
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Short name used in logs and `ResolveFailure::ParseFailed`.
    fn name(&self) -> &'static str;

    /// Try to resolve `reference`.
    async fn resolve(&self, reference: &BookReference) -> Resolution;
}

/// Exact-URL lookup into the built-in table of online books.
#[derive(Clone, Copy, Debug, Default)]
pub struct CatalogSource;

#[async_trait]
impl BookSource for CatalogSource {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn resolve(&self, reference: &BookReference) -> Resolution {
        let Some(url) = reference.as_url() else {
            return Resolution::Unrecognized;
        };
        match catalog::lookup(url) {
            Some(book) => Resolution::Recognized(book),
            None => Resolution::Unrecognized,
        }
    }
}

/// Reads local EPUB files.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContainerSource {
    limits: ZipLimits,
}

impl ContainerSource {
    /// Source with default ZIP limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Source with explicit ZIP limits.
    pub fn with_limits(limits: ZipLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl BookSource for ContainerSource {
    fn name(&self) -> &'static str {
        "container"
    }

    async fn resolve(&self, reference: &BookReference) -> Resolution {
        let BookReference::Local(path) = reference else {
            return Resolution::Unrecognized;
        };
        log::debug!("[EPUB] reading {}", path.display());
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => return Resolution::ParseFailed(EpubError::from(err)),
        };
        match parse_epub(&bytes, path, self.limits) {
            Ok(book) => Resolution::Recognized(book),
            Err(err) => Resolution::ParseFailed(err),
        }
    }
}

/// Parse an in-memory EPUB. `path` supplies the fallback title and the
/// metadata `source`.
pub fn parse_epub(bytes: &[u8], path: &Path, limits: ZipLimits) -> Result<ResolvedBook, EpubError> {
    let mut zip = ZipArchive::open_with_limits(Cursor::new(bytes), limits)?;
    zip.validate_mimetype()?;

    let container = zip.read("META-INF/container.xml")?;
    let opf_path = opf::parse_container_xml(&container)?;
    let package = opf::parse_package(&zip.read(&opf_path)?)?;

    let labels = toc_labels(&mut zip, &package, &opf_path);
    let chapters = read_chapters(&mut zip, &package, &opf_path, &labels)?;
    if chapters.is_empty() {
        return Err(EpubError::EmptySpine);
    }

    let meta = package.metadata;
    let fallback_title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());
    let metadata = BookMetadata {
        title: meta.title.unwrap_or(fallback_title),
        author: meta.creator.unwrap_or_else(|| "Unknown Author".to_string()),
        language: meta.language.unwrap_or_else(|| "en".to_string()),
        source: path.display().to_string(),
        publisher: meta.publisher,
        identifier: meta.identifier,
        date: meta.date,
        description: meta.description,
    };

    log::debug!(
        "[EPUB] '{}' parsed with {} chapters",
        metadata.title,
        chapters.len()
    );
    Ok(ResolvedBook {
        metadata,
        chapters,
        origin: LoadOrigin::Container,
    })
}

fn toc_labels(
    zip: &mut ZipArchive<Cursor<&[u8]>>,
    package: &Package,
    opf_path: &str,
) -> HashMap<String, String> {
    let Some(item) = package.toc_item() else {
        return HashMap::new();
    };
    let toc_path = opf::resolve_relative_path(opf_path, &item.href);
    let parsed = zip
        .read(&toc_path)
        .map_err(EpubError::from)
        .and_then(|content| opf::parse_toc_labels(&content, opf::is_ncx(item)));
    match parsed {
        Ok(labels) => opf::labels_by_path(&toc_path, labels),
        Err(err) => {
            log::warn!("[EPUB] ignoring unreadable table of contents {}: {}", toc_path, err);
            HashMap::new()
        }
    }
}

fn read_chapters(
    zip: &mut ZipArchive<Cursor<&[u8]>>,
    package: &Package,
    opf_path: &str,
    labels: &HashMap<String, String>,
) -> Result<Vec<Chapter>, EpubError> {
    let mut chapters = Vec::new();
    let mut seen = HashSet::new();

    for entry in package.spine.iter().filter(|entry| entry.linear) {
        let item = package
            .item(&entry.idref)
            .ok_or_else(|| EpubError::ManifestItemMissing {
                idref: entry.idref.clone(),
            })?;
        if !item.media_type.contains("html") {
            log::debug!("[EPUB] skipping non-document spine item {}", item.href);
            continue;
        }

        let path = opf::resolve_relative_path(opf_path, &item.href);
        let bytes = zip.read(&path)?;
        if std::str::from_utf8(&bytes).is_err() {
            return Err(EpubError::ChapterNotUtf8 { href: path });
        }
        let content = xhtml::extract_body(&bytes)?;
        let number = chapters.len() + 1;
        let title = match labels.get(&path) {
            Some(label) => label.clone(),
            None => xhtml::first_heading(&bytes)
                .ok()
                .flatten()
                .unwrap_or_else(|| format!("Section {}", number)),
        };

        let mut id = item.id.clone();
        let mut suffix = number;
        while !seen.insert(id.clone()) {
            id = format!("{}-{}", item.id, suffix);
            suffix += 1;
        }
        chapters.push(Chapter { id, title, content });
    }

    Ok(chapters)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ZipError;
    use crate::zip::tests::build_zip;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>The Time Machine</dc:title>
    <dc:creator>H. G. Wells</dc:creator>
    <dc:language>en-GB</dc:language>
    <dc:date>1895</dc:date>
    <dc:description>A scientist builds a machine that travels through time.</dc:description>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="cover" href="cover.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch3" href="text/ch3.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="cover" linear="no"/>
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
    <itemref idref="ch3"/>
  </spine>
</package>"#;

    const NCX: &str = r#"<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/">
  <navMap>
    <navPoint id="p1"><navLabel><text>The Inventor</text></navLabel><content src="text/ch1.xhtml"/></navPoint>
    <navPoint id="p2"><navLabel><text>The Machine</text></navLabel><content src="text/ch2.xhtml"/></navPoint>
  </navMap>
</ncx>"#;

    fn chapter(heading: Option<&str>, body: &str) -> String {
        let heading = heading.map(|h| format!("<h2>{}</h2>", h)).unwrap_or_default();
        format!(
            "<?xml version=\"1.0\"?><html xmlns=\"http://www.w3.org/1999/xhtml\"><body>{}<p>{}</p></body></html>",
            heading, body
        )
    }

    pub(crate) fn sample_epub() -> Vec<u8> {
        let ch1 = chapter(None, "The Time Traveller was expounding a recondite matter.");
        let ch2 = chapter(Some("Ignored Heading"), "I think that at that time none of us quite believed.");
        let ch3 = chapter(Some("In the Golden Age"), "In another moment we were standing face to face.");
        build_zip(&[
            ("mimetype", b"application/epub+zip", false),
            ("META-INF/container.xml", CONTAINER.as_bytes(), true),
            ("OEBPS/content.opf", OPF.as_bytes(), true),
            ("OEBPS/toc.ncx", NCX.as_bytes(), true),
            ("OEBPS/cover.xhtml", chapter(None, "cover").as_bytes(), false),
            ("OEBPS/text/ch1.xhtml", ch1.as_bytes(), true),
            ("OEBPS/text/ch2.xhtml", ch2.as_bytes(), true),
            ("OEBPS/text/ch3.xhtml", ch3.as_bytes(), false),
        ])
    }

    #[test]
    fn test_parse_epub_spine_and_titles() {
        let book = parse_epub(&sample_epub(), Path::new("/books/time.epub"), ZipLimits::default())
            .unwrap();
        assert_eq!(book.origin, LoadOrigin::Container);
        let ids: Vec<_> = book.chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ch1", "ch2", "ch3"]);
        let titles: Vec<_> = book.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["The Inventor", "The Machine", "In the Golden Age"]);
        assert!(book.chapters[0].content.starts_with("<p>The Time Traveller"));
        assert!(!book.chapters[0].content.contains("<body"));
    }

    #[test]
    fn test_parse_epub_metadata() {
        let book = parse_epub(&sample_epub(), Path::new("/books/time.epub"), ZipLimits::default())
            .unwrap();
        assert_eq!(book.metadata.title, "The Time Machine");
        assert_eq!(book.metadata.author, "H. G. Wells");
        assert_eq!(book.metadata.language, "en-GB");
        assert_eq!(book.metadata.date.as_deref(), Some("1895"));
        assert_eq!(book.metadata.source, "/books/time.epub");
        assert_eq!(
            book.metadata.description.as_deref(),
            Some("A scientist builds a machine that travels through time.")
        );
    }

    #[test]
    fn test_missing_title_uses_file_stem() {
        let opf = OPF.replace("<dc:title>The Time Machine</dc:title>", "");
        let bytes = build_zip(&[
            ("mimetype", b"application/epub+zip", false),
            ("META-INF/container.xml", CONTAINER.as_bytes(), false),
            ("OEBPS/content.opf", opf.as_bytes(), false),
            ("OEBPS/text/ch1.xhtml", chapter(None, "a").as_bytes(), false),
            ("OEBPS/text/ch2.xhtml", chapter(None, "b").as_bytes(), false),
            ("OEBPS/text/ch3.xhtml", chapter(None, "c").as_bytes(), false),
        ]);
        let book = parse_epub(&bytes, Path::new("downloads/wells.epub"), ZipLimits::default())
            .unwrap();
        assert_eq!(book.metadata.title, "wells");
        // No TOC file and no headings: numbered titles.
        assert_eq!(book.chapters[2].title, "Section 3");
    }

    #[test]
    fn test_untitled_chapter_renders_ordinal_once() {
        let bytes = build_zip(&[
            ("mimetype", b"application/epub+zip", false),
            ("META-INF/container.xml", CONTAINER.as_bytes(), false),
            ("OEBPS/content.opf", OPF.as_bytes(), false),
            ("OEBPS/text/ch1.xhtml", chapter(None, "a").as_bytes(), false),
            ("OEBPS/text/ch2.xhtml", chapter(None, "b").as_bytes(), false),
            ("OEBPS/text/ch3.xhtml", chapter(None, "c").as_bytes(), false),
        ]);
        let book = parse_epub(&bytes, Path::new("wells.epub"), ZipLimits::default()).unwrap();
        let doc = crate::render::render_chapter(
            &book.metadata,
            &book.chapters[0],
            0,
            &crate::render::RenderOptions::default(),
        );
        assert_eq!(doc.matches("Chapter 1").count(), 1);
        assert_eq!(doc.matches("Section 1").count(), 1);
    }

    #[test]
    fn test_repeated_spine_ids_stay_unique() {
        let opf = OPF
            .replace(
                r#"<item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>"#,
                r#"<item id="a-3" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="a" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>"#,
            )
            .replace(
                r#"<itemref idref="ch1"/>
    <itemref idref="ch2"/>
    <itemref idref="ch3"/>"#,
                r#"<itemref idref="a-3"/>
    <itemref idref="a"/>
    <itemref idref="a"/>"#,
            );
        let bytes = build_zip(&[
            ("mimetype", b"application/epub+zip", false),
            ("META-INF/container.xml", CONTAINER.as_bytes(), false),
            ("OEBPS/content.opf", opf.as_bytes(), false),
            ("OEBPS/text/ch1.xhtml", chapter(None, "a").as_bytes(), false),
            ("OEBPS/text/ch2.xhtml", chapter(None, "b").as_bytes(), false),
        ]);
        let book = parse_epub(&bytes, Path::new("x.epub"), ZipLimits::default()).unwrap();
        let ids: Vec<_> = book.chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a-3", "a", "a-4"]);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_spine_with_missing_manifest_item() {
        let opf = OPF.replace(r#"<itemref idref="ch3"/>"#, r#"<itemref idref="ghost"/>"#);
        let bytes = build_zip(&[
            ("mimetype", b"application/epub+zip", false),
            ("META-INF/container.xml", CONTAINER.as_bytes(), false),
            ("OEBPS/content.opf", opf.as_bytes(), false),
            ("OEBPS/text/ch1.xhtml", chapter(None, "a").as_bytes(), false),
            ("OEBPS/text/ch2.xhtml", chapter(None, "b").as_bytes(), false),
        ]);
        let err = parse_epub(&bytes, Path::new("x.epub"), ZipLimits::default()).unwrap_err();
        assert_eq!(
            err,
            EpubError::ManifestItemMissing {
                idref: "ghost".into()
            }
        );
    }

    #[test]
    fn test_empty_spine() {
        let opf = r#"<package><metadata/><manifest/><spine/></package>"#;
        let bytes = build_zip(&[
            ("mimetype", b"application/epub+zip", false),
            ("META-INF/container.xml", CONTAINER.as_bytes(), false),
            ("OEBPS/content.opf", opf.as_bytes(), false),
        ]);
        let err = parse_epub(&bytes, Path::new("x.epub"), ZipLimits::default()).unwrap_err();
        assert_eq!(err, EpubError::EmptySpine);
    }

    #[test]
    fn test_not_a_zip() {
        let err = parse_epub(b"plain text", Path::new("x.epub"), ZipLimits::default()).unwrap_err();
        assert!(matches!(err, EpubError::Zip(_)));
    }

    #[test]
    fn test_wrong_mimetype() {
        let bytes = build_zip(&[("mimetype", b"application/zip", false)]);
        let err = parse_epub(&bytes, Path::new("x.epub"), ZipLimits::default()).unwrap_err();
        assert!(matches!(err, EpubError::Zip(ZipError::InvalidMimetype(_))));
    }

    #[tokio::test]
    async fn test_catalog_source() {
        let source = CatalogSource;
        let alice = BookReference::from("https://www.gutenberg.org/ebooks/11.kindle.images/epub/11.epub");
        assert!(matches!(source.resolve(&alice).await, Resolution::Recognized(_)));
        let other = BookReference::from("https://example.com/book.epub");
        assert_eq!(source.resolve(&other).await, Resolution::Unrecognized);
        assert_eq!(source.resolve(&BookReference::None).await, Resolution::Unrecognized);
    }

    #[tokio::test]
    async fn test_container_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("time-machine.epub");
        std::fs::write(&path, sample_epub()).unwrap();

        let resolution = ContainerSource::new()
            .resolve(&BookReference::Local(path))
            .await;
        let Resolution::Recognized(book) = resolution else {
            panic!("expected a book, got {:?}", resolution);
        };
        assert_eq!(book.chapters.len(), 3);
    }

    #[tokio::test]
    async fn test_container_source_declines_remote() {
        let reference = BookReference::from("https://example.com/book.epub");
        assert_eq!(
            ContainerSource::new().resolve(&reference).await,
            Resolution::Unrecognized
        );
    }

    #[tokio::test]
    async fn test_container_source_missing_file() {
        let reference = BookReference::from("not-a-real-url");
        assert!(matches!(
            ContainerSource::new().resolve(&reference).await,
            Resolution::ParseFailed(EpubError::Io(_))
        ));
    }
}
