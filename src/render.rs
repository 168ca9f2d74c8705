//! Standalone chapter documents.
//!
//! Each chapter renders into a complete HTML document with its own
//! stylesheet. Light colours are the default and a
//! `prefers-color-scheme: dark` media block overrides them, so the
//! embedding view switches appearance without re-rendering.

use std::fmt::Write as _;
use std::sync::Arc;

use quick_xml::escape::{escape, partial_escape};

use crate::book::{BookMetadata, Chapter};

/// Smallest accepted body font size in CSS pixels
pub const MIN_FONT_SIZE_PX: u32 = 12;
/// Largest accepted body font size in CSS pixels
pub const MAX_FONT_SIZE_PX: u32 = 24;
/// Step used by `RenderOptions::larger` / `smaller`
pub const FONT_SIZE_STEP_PX: u32 = 2;

/// Background and text colour pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Page background colour
    pub background: String,
    /// Body text colour
    pub text: String,
    /// Secondary text colour (chapter number, attribution)
    pub muted: String,
}

impl Palette {
    fn light() -> Self {
        Self {
            background: "#f5f5f5".into(),
            text: "#000000".into(),
            muted: "#666666".into(),
        }
    }

    fn dark() -> Self {
        Self {
            background: "#000000".into(),
            text: "#ffffff".into(),
            muted: "#aaaaaa".into(),
        }
    }
}

/// Styling knobs applied when a chapter document is built.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    font_size_px: u32,
    /// Line height as a multiple of the font size
    pub line_height: f32,
    /// Justify paragraph text
    pub justify: bool,
    /// Colours used without a dark preference
    pub light: Palette,
    /// Colours used under `prefers-color-scheme: dark`
    pub dark: Palette,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            font_size_px: 16,
            line_height: 1.6,
            justify: true,
            light: Palette::light(),
            dark: Palette::dark(),
        }
    }
}

impl RenderOptions {
    /// Body font size in CSS pixels.
    pub fn font_size_px(&self) -> u32 {
        self.font_size_px
    }

    /// Set the font size, clamped to the supported range.
    pub fn with_font_size(mut self, px: u32) -> Self {
        self.font_size_px = px.clamp(MIN_FONT_SIZE_PX, MAX_FONT_SIZE_PX);
        self
    }

    /// One step larger, up to the maximum.
    pub fn larger(self) -> Self {
        let px = self.font_size_px + FONT_SIZE_STEP_PX;
        self.with_font_size(px)
    }

    /// One step smaller, down to the minimum.
    pub fn smaller(self) -> Self {
        let px = self.font_size_px.saturating_sub(FONT_SIZE_STEP_PX);
        self.with_font_size(px)
    }
}

/// A rendered chapter document. Cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedDocument(Arc<str>);

impl RenderedDocument {
    /// Document markup.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RenderedDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for RenderedDocument {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RenderedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render `chapter`, the `index`-th (0-based) chapter of the book.
pub fn render_chapter(
    metadata: &BookMetadata,
    chapter: &Chapter,
    index: usize,
    options: &RenderOptions,
) -> RenderedDocument {
    let mut out = String::with_capacity(chapter.content.len() + 2048);
    let lang = if metadata.language.is_empty() {
        "en"
    } else {
        metadata.language.as_str()
    };

    out.push_str("<!DOCTYPE html>\n");
    let _ = writeln!(out, "<html lang=\"{}\">", escape(lang));
    out.push_str("<head>\n<meta charset=\"utf-8\"/>\n");
    out.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1, maximum-scale=1\"/>\n",
    );
    let _ = writeln!(out, "<title>{}</title>", partial_escape(&metadata.title));
    out.push_str("<style>\n");
    write_stylesheet(&mut out, options);
    out.push_str("</style>\n</head>\n<body>\n");

    let _ = writeln!(
        out,
        "<article class=\"chapter\" id=\"{}\">",
        escape(&chapter.id)
    );
    let _ = writeln!(out, "<p class=\"chapter-number\">Chapter {}</p>", index + 1);
    let _ = writeln!(
        out,
        "<h1 class=\"chapter-title\">{}</h1>",
        partial_escape(&chapter.title)
    );
    out.push_str("<div class=\"chapter-body\">\n");
    out.push_str(chapter.content.trim());
    out.push_str("\n</div>\n");
    let _ = write!(
        out,
        "<footer class=\"attribution\">From <em>{}</em>",
        partial_escape(&metadata.title)
    );
    if !metadata.author.is_empty() {
        let _ = write!(out, " by {}", partial_escape(&metadata.author));
    }
    out.push_str("</footer>\n</article>\n</body>\n</html>\n");

    RenderedDocument(Arc::from(out))
}

fn write_stylesheet(out: &mut String, options: &RenderOptions) {
    let align = if options.justify { "justify" } else { "left" };
    let _ = write!(
        out,
        "html, body {{ margin: 0; padding: 0; }}\n\
         body {{ background: {bg}; color: {fg}; font-family: Georgia, 'Times New Roman', serif; \
         font-size: {size}px; line-height: {lh}; padding: 20px; }}\n\
         .chapter-number {{ color: {muted}; font-size: 0.85em; letter-spacing: 0.1em; \
         text-transform: uppercase; text-align: center; margin: 0 0 0.5em; }}\n\
         .chapter-title {{ font-size: 1.5em; font-weight: 700; text-align: center; margin: 0 0 1.25em; }}\n\
         .chapter-body p {{ text-align: {align}; margin: 0 0 1em; }}\n\
         .chapter-body img {{ max-width: 100%; height: auto; }}\n\
         .attribution {{ color: {muted}; font-size: 0.8em; text-align: center; margin-top: 3em; }}\n",
        bg = options.light.background,
        fg = options.light.text,
        muted = options.light.muted,
        size = options.font_size_px,
        lh = options.line_height,
        align = align,
    );
    let _ = write!(
        out,
        "@media (prefers-color-scheme: dark) {{\n  \
         body {{ background: {bg}; color: {fg}; }}\n  \
         .chapter-number, .attribution {{ color: {muted}; }}\n}}\n",
        bg = options.dark.background,
        fg = options.dark.text,
        muted = options.dark.muted,
    );
}
