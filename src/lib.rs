//! chapter_nav -- chapter navigation for e-book readers
//!
//! Resolves a book reference (a catalog URL, a local EPUB file, or nothing
//! at all) into an ordered list of chapters, renders every chapter into a
//! standalone styled document, and exposes a cursor with `next`,
//! `previous` and direct jumps. Progress is reported to subscribers as
//! `Loaded`, `ChapterChanged` and `Error` events.
//!
//! Resolution never fails: when no source can produce a book, the
//! built-in welcome book is loaded and an `Error` event says why.
//!
//! # Features
//!
//! - `serde` -- `Serialize` for book types, `Deserialize` for `BookDescriptor`
//! - `cli` -- the `chapter-nav` inspection binary
//!
//! # Example
//!
//! ```no_run
//! use chapter_nav::{ChapterNavigator, EventKind, NavigatorEvent};
//!
//! # async fn run() -> Result<(), chapter_nav::NavigatorError> {
//! let mut nav = ChapterNavigator::new(
//!     "https://www.gutenberg.org/ebooks/11.kindle.images/epub/11.epub",
//! );
//! let _ = nav.subscribe(EventKind::ChapterChanged, |event| {
//!     if let NavigatorEvent::ChapterChanged { index, chapter } = event {
//!         println!("now reading {}: {}", index, chapter.title);
//!     }
//! });
//! nav.init().await;
//! while let Some(document) = nav.next().await? {
//!     assert!(document.starts_with("<!DOCTYPE html>"));
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(clippy::large_enum_variant, clippy::large_stack_arrays, clippy::redundant_clone)]
#![warn(
    clippy::box_collection,
    clippy::needless_collect,
    clippy::map_clone,
    clippy::implicit_clone,
    clippy::inefficient_to_string
)]

pub mod book;
pub mod catalog;
pub mod error;
pub mod events;
pub mod navigator;
pub mod opf;
pub mod render;
pub mod source;
pub mod xhtml;
pub mod zip;

// Re-export key types for convenience
pub use book::{
    BookDescriptor, BookMetadata, BookReference, Chapter, ContentStats, LoadOrigin, ResolvedBook,
};
pub use error::{EpubError, NavigatorError, ZipError};
pub use events::{EventBus, EventKind, NavigatorEvent, ResolveFailure, Subscription};
pub use navigator::{ChapterNavigator, NavigatorBuilder, NavigatorOptions};
pub use render::{render_chapter, Palette, RenderOptions, RenderedDocument};
pub use source::{parse_epub, BookSource, CatalogSource, ContainerSource, Resolution};
pub use zip::{ZipArchive, ZipLimits};
