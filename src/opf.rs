//! Package document parsing with quick-xml
//!
//! Parses `META-INF/container.xml` to locate the OPF package, then pulls
//! Dublin Core metadata, the manifest and the spine out of the OPF in a
//! single SAX-style pass. Table of contents labels come from either an
//! EPUB 2 NCX or an EPUB 3 XHTML nav document.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::EpubError;

/// Maximum number of manifest items kept
const MAX_MANIFEST_ITEMS: usize = 2048;

/// Maximum number of spine entries kept
const MAX_SPINE_ITEMS: usize = 1024;

/// A manifest resource (id -> href mapping)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestItem {
    /// Resource identifier
    pub id: String,
    /// Path relative to the OPF
    pub href: String,
    /// MIME type
    pub media_type: String,
    /// Space separated properties (e.g. "nav")
    pub properties: Option<String>,
}

impl ManifestItem {
    /// Whether `properties` lists the given token.
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|p| p.split_whitespace().any(|token| token == property))
    }
}

/// A spine entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpineEntry {
    /// Manifest id this entry points at
    pub idref: String,
    /// `linear="no"` entries are auxiliary content
    pub linear: bool,
}

/// Dublin Core fields read from `<metadata>`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    /// dc:title (first occurrence)
    pub title: Option<String>,
    /// dc:creator (first occurrence)
    pub creator: Option<String>,
    /// dc:language
    pub language: Option<String>,
    /// dc:publisher
    pub publisher: Option<String>,
    /// dc:identifier (first occurrence)
    pub identifier: Option<String>,
    /// dc:date
    pub date: Option<String>,
    /// dc:description
    pub description: Option<String>,
}

/// Parsed OPF package
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Package {
    /// Book metadata
    pub metadata: PackageMetadata,
    /// Manifest in document order
    pub manifest: Vec<ManifestItem>,
    /// Reading order
    pub spine: Vec<SpineEntry>,
    /// `<spine toc="...">` NCX reference (EPUB 2)
    pub toc_id: Option<String>,
}

impl Package {
    /// Manifest item by id.
    pub fn item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// Navigation document: the spine's NCX, then an EPUB 3 `nav` item,
    /// then any NCX in the manifest.
    pub fn toc_item(&self) -> Option<&ManifestItem> {
        self.toc_id
            .as_deref()
            .and_then(|id| self.item(id))
            .or_else(|| self.manifest.iter().find(|item| item.has_property("nav")))
            .or_else(|| self.manifest.iter().find(|item| is_ncx(item)))
    }
}

/// Whether the manifest item is an EPUB 2 NCX document.
pub fn is_ncx(item: &ManifestItem) -> bool {
    item.media_type == "application/x-dtbncx+xml" || item.href.to_ascii_lowercase().ends_with(".ncx")
}

/// Parse container.xml and return the first rootfile `full-path`.
pub fn parse_container_xml(content: &[u8]) -> Result<String, EpubError> {
    let mut reader = xml_reader(content);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == "rootfile" => {
                if let Some(path) = attribute(&e, &reader, "full-path")? {
                    if !path.is_empty() {
                        return Ok(path);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Err(EpubError::InvalidEpub(
        "No rootfile found in container.xml".into(),
    ))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Metadata,
    Manifest,
    Spine,
}

/// Parse an OPF package document.
pub fn parse_package(content: &[u8]) -> Result<Package, EpubError> {
    let mut reader = xml_reader(content);
    let mut buf = Vec::new();
    let mut package = Package::default();
    let mut section = Section::Other;
    let mut field: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = local_name(e.name().as_ref());
                match name.as_str() {
                    "metadata" => section = Section::Metadata,
                    "manifest" => section = Section::Manifest,
                    "spine" => {
                        section = Section::Spine;
                        package.toc_id = attribute(&e, &reader, "toc")?.filter(|v| !v.is_empty());
                    }
                    _ if section == Section::Metadata => {
                        field = Some(name);
                        text.clear();
                    }
                    _ => handle_item(&e, &reader, section, &name, &mut package)?,
                }
            }
            Event::Empty(e) => {
                let name = local_name(e.name().as_ref());
                if name == "spine" {
                    package.toc_id = attribute(&e, &reader, "toc")?.filter(|v| !v.is_empty());
                } else {
                    handle_item(&e, &reader, section, &name, &mut package)?;
                }
            }
            Event::Text(e) if field.is_some() => {
                text.push_str(&e.decode().map_err(decode_error)?);
            }
            Event::GeneralRef(e) if field.is_some() => {
                let name = e.decode().map_err(decode_error)?;
                text.push_str(&resolve_entity(&name));
            }
            Event::End(e) => {
                let name = local_name(e.name().as_ref());
                match name.as_str() {
                    "metadata" | "manifest" | "spine" => section = Section::Other,
                    _ => {}
                }
                if let Some(current) = field.take() {
                    if current == name {
                        store_field(&mut package.metadata, &current, text.trim());
                    }
                    text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    log::debug!(
        "[OPF] parsed {} manifest items, {} spine entries",
        package.manifest.len(),
        package.spine.len()
    );
    Ok(package)
}

fn handle_item(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    section: Section,
    name: &str,
    package: &mut Package,
) -> Result<(), EpubError> {
    match (section, name) {
        (Section::Manifest, "item") if package.manifest.len() < MAX_MANIFEST_ITEMS => {
            let id = attribute(e, reader, "id")?;
            let href = attribute(e, reader, "href")?;
            let media_type = attribute(e, reader, "media-type")?;
            // Items missing a required attribute are skipped.
            if let (Some(id), Some(href), Some(media_type)) = (id, href, media_type) {
                package.manifest.push(ManifestItem {
                    id,
                    href,
                    media_type,
                    properties: attribute(e, reader, "properties")?,
                });
            }
        }
        (Section::Spine, "itemref") if package.spine.len() < MAX_SPINE_ITEMS => {
            if let Some(idref) = attribute(e, reader, "idref")? {
                let linear = attribute(e, reader, "linear")?.map_or(true, |v| v != "no");
                package.spine.push(SpineEntry { idref, linear });
            }
        }
        _ => {}
    }
    Ok(())
}

fn store_field(metadata: &mut PackageMetadata, name: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let slot = match name {
        "title" => &mut metadata.title,
        "creator" => &mut metadata.creator,
        "language" => &mut metadata.language,
        "publisher" => &mut metadata.publisher,
        "identifier" => &mut metadata.identifier,
        "date" => &mut metadata.date,
        "description" => &mut metadata.description,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

/// Extract `href -> label` pairs from a navigation document.
///
/// Hrefs are returned as written in the document, without fragments.
/// The first label seen for an href wins.
pub fn parse_toc_labels(content: &[u8], ncx: bool) -> Result<Vec<(String, String)>, EpubError> {
    if ncx {
        parse_ncx_labels(content)
    } else {
        parse_nav_labels(content)
    }
}

#[derive(Default)]
struct PendingPoint {
    label: Option<String>,
    src: Option<String>,
    emitted: bool,
}

impl PendingPoint {
    // Emit as soon as both halves are known so a parent entry is recorded
    // before the children nested below it.
    fn flush(&mut self, labels: &mut Vec<(String, String)>) {
        if self.emitted {
            return;
        }
        if let (Some(label), Some(src)) = (&self.label, &self.src) {
            push_label(labels, src, label.clone());
            self.emitted = true;
        }
    }
}

fn parse_ncx_labels(content: &[u8]) -> Result<Vec<(String, String)>, EpubError> {
    let mut reader = xml_reader(content);
    let mut buf = Vec::new();
    let mut stack: Vec<PendingPoint> = Vec::new();
    let mut in_label_text = false;
    let mut text = String::new();
    let mut labels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local_name(e.name().as_ref()).as_str() {
                "navPoint" => stack.push(PendingPoint::default()),
                "text" if !stack.is_empty() => {
                    in_label_text = true;
                    text.clear();
                }
                "content" => set_point_src(&e, &reader, &mut stack, &mut labels)?,
                _ => {}
            },
            Event::Empty(e) if local_name(e.name().as_ref()) == "content" => {
                set_point_src(&e, &reader, &mut stack, &mut labels)?;
            }
            Event::Text(e) if in_label_text => {
                text.push_str(&e.decode().map_err(decode_error)?);
            }
            Event::GeneralRef(e) if in_label_text => {
                text.push_str(&resolve_entity(&e.decode().map_err(decode_error)?));
            }
            Event::End(e) => match local_name(e.name().as_ref()).as_str() {
                "text" if in_label_text => {
                    in_label_text = false;
                    if let Some(point) = stack.last_mut() {
                        if point.label.is_none() {
                            point.label = Some(collapse_whitespace(&text));
                        }
                        point.flush(&mut labels);
                    }
                }
                "navPoint" => {
                    stack.pop();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(labels)
}

fn set_point_src(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    stack: &mut [PendingPoint],
    labels: &mut Vec<(String, String)>,
) -> Result<(), EpubError> {
    if let Some(point) = stack.last_mut() {
        if point.src.is_none() {
            point.src = attribute(e, reader, "src")?;
        }
        point.flush(labels);
    }
    Ok(())
}

fn parse_nav_labels(content: &[u8]) -> Result<Vec<(String, String)>, EpubError> {
    let mut reader = xml_reader(content);
    let mut buf = Vec::new();
    let mut nav_depth = 0usize;
    let mut in_toc = false;
    let mut anchor: Option<String> = None;
    let mut text = String::new();
    let mut labels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local_name(e.name().as_ref()).as_str() {
                "nav" => {
                    nav_depth += 1;
                    let kind = attribute(&e, &reader, "type")?;
                    let role = attribute(&e, &reader, "role")?;
                    if kind.as_deref().is_some_and(|k| k.split_whitespace().any(|t| t == "toc"))
                        || role.as_deref() == Some("doc-toc")
                    {
                        in_toc = true;
                    }
                }
                "a" if in_toc => {
                    anchor = attribute(&e, &reader, "href")?;
                    text.clear();
                }
                _ => {}
            },
            Event::Text(e) if anchor.is_some() => {
                text.push_str(&e.decode().map_err(decode_error)?);
            }
            Event::GeneralRef(e) if anchor.is_some() => {
                text.push_str(&resolve_entity(&e.decode().map_err(decode_error)?));
            }
            Event::End(e) => match local_name(e.name().as_ref()).as_str() {
                "a" => {
                    if let Some(href) = anchor.take() {
                        let label = collapse_whitespace(&text);
                        if !label.is_empty() {
                            push_label(&mut labels, &href, label);
                        }
                    }
                }
                "nav" => {
                    nav_depth = nav_depth.saturating_sub(1);
                    if nav_depth == 0 {
                        in_toc = false;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(labels)
}

fn push_label(labels: &mut Vec<(String, String)>, href: &str, label: String) {
    let href = strip_fragment(href);
    if href.is_empty() || labels.iter().any(|(existing, _)| existing == href) {
        return;
    }
    labels.push((href.to_string(), label));
}

/// Map `href -> label` pairs onto archive paths using `base` as the
/// document the hrefs were written in.
pub fn labels_by_path(base: &str, labels: Vec<(String, String)>) -> HashMap<String, String> {
    labels
        .into_iter()
        .map(|(href, label)| (resolve_relative_path(base, &href), label))
        .collect()
}

/// Resolve an href relative to the archive path of the document holding it.
pub fn resolve_relative_path(base: &str, href: &str) -> String {
    let href = strip_fragment(href);
    if let Some(absolute) = href.strip_prefix('/') {
        return normalize_path(absolute);
    }
    match base.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => normalize_path(&format!("{}/{}", dir, href)),
        _ => normalize_path(href),
    }
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}

fn strip_fragment(href: &str) -> &str {
    href.split('#').next().unwrap_or(href)
}

pub(crate) fn xml_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;
    reader
}

pub(crate) fn local_name(name: &[u8]) -> String {
    let local = match name.iter().rposition(|b| *b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    };
    String::from_utf8_lossy(local).into_owned()
}

/// Attribute value by local name, with entity references resolved.
pub(crate) fn attribute(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    key: &str,
) -> Result<Option<String>, EpubError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| EpubError::Parse(format!("Attr error: {:?}", err)))?;
        if local_name(attr.key.as_ref()) != key {
            continue;
        }
        let raw = reader.decoder().decode(&attr.value).map_err(decode_error)?;
        let value = match quick_xml::escape::unescape(&raw) {
            Ok(value) => value.into_owned(),
            Err(_) => raw.to_string(),
        };
        return Ok(Some(value));
    }
    Ok(None)
}

/// Resolve an entity reference name (without `&` and `;`).
pub(crate) fn resolve_entity(name: &str) -> String {
    match name {
        "nbsp" => " ".to_string(),
        "mdash" => "\u{2014}".to_string(),
        "ndash" => "\u{2013}".to_string(),
        "hellip" => "\u{2026}".to_string(),
        _ => quick_xml::escape::unescape(&format!("&{};", name))
            .map(|v| v.into_owned())
            .unwrap_or_default(),
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_error<E: std::fmt::Debug>(err: E) -> EpubError {
    EpubError::Parse(format!("Decode error: {:?}", err))
}
