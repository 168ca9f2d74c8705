//! Chapter navigator: resolves a book once, then moves a cursor over its
//! pre-rendered chapters.

use std::collections::{HashMap, HashSet};

use crate::book::{BookMetadata, BookReference, Chapter, LoadOrigin, ResolvedBook};
use crate::catalog;
use crate::error::{EpubError, NavigatorError};
use crate::events::{EventBus, EventKind, NavigatorEvent, ResolveFailure, Subscription};
use crate::render::{render_chapter, RenderOptions, RenderedDocument};
use crate::source::{BookSource, CatalogSource, ContainerSource, Resolution};
use crate::zip::ZipLimits;

/// Configuration applied when a navigator is built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavigatorOptions {
    /// Styling for rendered chapter documents
    pub render: RenderOptions,
    /// Limits for the default container source
    pub zip_limits: ZipLimits,
}

/// Builder for `ChapterNavigator`.
#[derive(Default)]
pub struct NavigatorBuilder {
    reference: BookReference,
    options: NavigatorOptions,
    sources: Option<Vec<Box<dyn BookSource>>>,
}

impl NavigatorBuilder {
    /// Builder for `reference` with default options and sources.
    pub fn new(reference: impl Into<BookReference>) -> Self {
        Self {
            reference: reference.into(),
            ..Self::default()
        }
    }

    /// Replace all options.
    pub fn with_options(mut self, options: NavigatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.options.render = render;
        self
    }

    /// Set ZIP limits for the default container source.
    pub fn with_zip_limits(mut self, limits: ZipLimits) -> Self {
        self.options.zip_limits = limits;
        self
    }

    /// Append a source. The first call replaces the default source list.
    pub fn with_source(mut self, source: impl BookSource + 'static) -> Self {
        self.sources
            .get_or_insert_with(Vec::new)
            .push(Box::new(source));
        self
    }

    /// Replace the source list. An empty list always loads the default book.
    pub fn with_sources(mut self, sources: Vec<Box<dyn BookSource>>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Build the navigator. Performs no I/O.
    pub fn build(self) -> ChapterNavigator {
        let sources = self.sources.unwrap_or_else(|| {
            vec![
                Box::new(CatalogSource) as Box<dyn BookSource>,
                Box::new(ContainerSource::with_limits(self.options.zip_limits)),
            ]
        });
        ChapterNavigator {
            reference: self.reference,
            options: self.options,
            sources,
            events: EventBus::new(),
            loaded: None,
        }
    }
}

#[derive(Debug)]
struct LoadedBook {
    metadata: BookMetadata,
    chapters: Vec<Chapter>,
    rendered: HashMap<String, RenderedDocument>,
    origin: LoadOrigin,
    current: usize,
}

/// Cursor over the chapters of one book.
///
/// Every method except `init`, `subscribe` and `is_initialized` returns
/// `NavigatorError::Uninitialized` until `init` has completed.
pub struct ChapterNavigator {
    reference: BookReference,
    options: NavigatorOptions,
    sources: Vec<Box<dyn BookSource>>,
    events: EventBus,
    loaded: Option<LoadedBook>,
}

impl std::fmt::Debug for ChapterNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sources: Vec<_> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("ChapterNavigator")
            .field("reference", &self.reference)
            .field("sources", &sources)
            .field("loaded", &self.loaded.as_ref().map(|b| b.origin))
            .finish()
    }
}

impl ChapterNavigator {
    /// Navigator for `reference` with default options and sources.
    pub fn new(reference: impl Into<BookReference>) -> Self {
        NavigatorBuilder::new(reference).build()
    }

    /// Start configuring a navigator.
    pub fn builder(reference: impl Into<BookReference>) -> NavigatorBuilder {
        NavigatorBuilder::new(reference)
    }

    /// The reference this navigator was built for.
    pub fn reference(&self) -> &BookReference {
        &self.reference
    }

    /// Options this navigator was built with.
    pub fn options(&self) -> &NavigatorOptions {
        &self.options
    }

    /// Resolve and render the book.
    ///
    /// Never fails: any resolution problem is reported through `Error`
    /// events and the built-in book is loaded instead. Calling `init` again
    /// returns the same origin and emits nothing.
    pub async fn init(&mut self) -> LoadOrigin {
        if let Some(book) = &self.loaded {
            return book.origin;
        }

        let book = self.resolve().await;
        let rendered: HashMap<_, _> = book
            .chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| {
                let document = render_chapter(&book.metadata, chapter, index, &self.options.render);
                (chapter.id.clone(), document)
            })
            .collect();

        let origin = book.origin;
        log::info!(
            "[NAV] loaded '{}' ({} chapters, origin {})",
            book.metadata.title,
            book.chapters.len(),
            origin
        );
        let event = NavigatorEvent::Loaded {
            chapter_count: book.chapters.len(),
            metadata: book.metadata.clone(),
            is_online: origin.is_online(),
        };
        self.loaded = Some(LoadedBook {
            metadata: book.metadata,
            chapters: book.chapters,
            rendered,
            origin,
            current: 0,
        });
        self.events.emit(&event);
        origin
    }

    async fn resolve(&self) -> ResolvedBook {
        let mut recognized = false;
        for source in &self.sources {
            log::debug!("[NAV] trying {} source for {}", source.name(), self.reference);
            match source.resolve(&self.reference).await {
                Resolution::Recognized(book) => {
                    if book.chapters.is_empty() {
                        recognized = true;
                        self.report_failure(source.name(), EpubError::EmptySpine);
                    } else if let Some(id) = duplicate_chapter_id(&book.chapters) {
                        recognized = true;
                        self.report_failure(source.name(), EpubError::DuplicateChapterId { id });
                    } else {
                        return book;
                    }
                }
                Resolution::Unrecognized => {}
                Resolution::ParseFailed(error) => {
                    recognized = true;
                    self.report_failure(source.name(), error);
                }
            }
        }

        if self.reference.is_some() && !recognized {
            log::warn!(
                "[NAV] no source recognized {}, loading the built-in book",
                self.reference
            );
            self.events
                .emit(&NavigatorEvent::Error(ResolveFailure::Unrecognized {
                    reference: self.reference.to_string(),
                }));
        }
        catalog::default_book()
    }

    fn report_failure(&self, source_name: &'static str, error: EpubError) {
        log::warn!(
            "[NAV] {} source failed for {}: {}",
            source_name,
            self.reference,
            error
        );
        self.events
            .emit(&NavigatorEvent::Error(ResolveFailure::ParseFailed {
                source_name,
                error,
            }));
    }

    /// Register a handler for events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&NavigatorEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, handler)
    }

    /// Alias for `subscribe`.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&NavigatorEvent) + Send + Sync + 'static,
    {
        self.subscribe(kind, handler)
    }

    /// Whether `init` has completed.
    pub fn is_initialized(&self) -> bool {
        self.loaded.is_some()
    }

    fn book(&self) -> Result<&LoadedBook, NavigatorError> {
        self.loaded.as_ref().ok_or(NavigatorError::Uninitialized)
    }

    /// Copy of the chapter list in reading order.
    pub fn chapters(&self) -> Result<Vec<Chapter>, NavigatorError> {
        Ok(self.book()?.chapters.clone())
    }

    /// Rendered document for `index`. Does not move the cursor.
    pub fn chapter_content(&self, index: usize) -> Result<RenderedDocument, NavigatorError> {
        let book = self.book()?;
        book.chapters
            .get(index)
            .and_then(|chapter| book.rendered.get(&chapter.id))
            .cloned()
            .ok_or(NavigatorError::ChapterOutOfRange {
                index,
                chapter_count: book.chapters.len(),
            })
    }

    /// Advance one chapter. Returns `None` on the last chapter.
    pub async fn next(&mut self) -> Result<Option<RenderedDocument>, NavigatorError> {
        let book = self.book()?;
        if book.current + 1 >= book.chapters.len() {
            return Ok(None);
        }
        let target = book.current + 1;
        self.move_to(target).map(Some)
    }

    /// Step back one chapter. Returns `None` on the first chapter.
    pub async fn previous(&mut self) -> Result<Option<RenderedDocument>, NavigatorError> {
        let book = self.book()?;
        if book.current == 0 {
            return Ok(None);
        }
        let target = book.current - 1;
        self.move_to(target).map(Some)
    }

    /// Jump to `index`.
    ///
    /// Unlike `next` and `previous`, an out-of-range target is an error
    /// rather than `None`.
    pub async fn go_to_chapter(&mut self, index: usize) -> Result<RenderedDocument, NavigatorError> {
        let chapter_count = self.book()?.chapters.len();
        if index >= chapter_count {
            return Err(NavigatorError::InvalidIndex {
                index,
                chapter_count,
            });
        }
        self.move_to(index)
    }

    /// Jump to the chapter with the given id.
    pub async fn go_to_chapter_id(&mut self, id: &str) -> Result<RenderedDocument, NavigatorError> {
        let index = self
            .book()?
            .chapters
            .iter()
            .position(|chapter| chapter.id == id)
            .ok_or_else(|| NavigatorError::UnknownChapter { id: id.to_string() })?;
        self.move_to(index)
    }

    fn move_to(&mut self, index: usize) -> Result<RenderedDocument, NavigatorError> {
        let book = self.loaded.as_mut().ok_or(NavigatorError::Uninitialized)?;
        let chapter = book.chapters.get(index).cloned().ok_or(NavigatorError::InvalidIndex {
            index,
            chapter_count: book.chapters.len(),
        })?;
        let content = book
            .rendered
            .get(&chapter.id)
            .cloned()
            .ok_or(NavigatorError::ChapterOutOfRange {
                index,
                chapter_count: book.chapters.len(),
            })?;
        book.current = index;
        let event = NavigatorEvent::ChapterChanged { index, chapter };
        log::debug!("[NAV] moved to chapter {}", index);
        self.events.emit(&event);
        Ok(content)
    }

    /// Book metadata.
    pub fn metadata(&self) -> Result<&BookMetadata, NavigatorError> {
        Ok(&self.book()?.metadata)
    }

    /// Cursor position (0-based).
    pub fn current_chapter_index(&self) -> Result<usize, NavigatorError> {
        Ok(self.book()?.current)
    }

    /// Chapter under the cursor.
    pub fn current_chapter(&self) -> Result<&Chapter, NavigatorError> {
        let book = self.book()?;
        Ok(&book.chapters[book.current])
    }

    /// Number of chapters.
    pub fn total_chapters(&self) -> Result<usize, NavigatorError> {
        Ok(self.book()?.chapters.len())
    }

    /// Whether the book came from the online catalog.
    pub fn is_online_book(&self) -> Result<bool, NavigatorError> {
        Ok(self.book()?.origin.is_online())
    }

    /// Which path produced the loaded book.
    pub fn origin(&self) -> Result<LoadOrigin, NavigatorError> {
        Ok(self.book()?.origin)
    }

    /// `(current index, total chapters)` for progress displays.
    pub fn progress(&self) -> Result<(usize, usize), NavigatorError> {
        let book = self.book()?;
        Ok((book.current, book.chapters.len()))
    }

    /// Share of the book read, counting the current chapter, in `0..=100`.
    pub fn progress_percent(&self) -> Result<u8, NavigatorError> {
        let (current, total) = self.progress()?;
        if total == 0 {
            return Ok(0);
        }
        let percent = ((current + 1) * 100 / total).min(100);
        Ok(percent as u8)
    }
}

fn duplicate_chapter_id(chapters: &[Chapter]) -> Option<String> {
    let mut seen = HashSet::new();
    for chapter in chapters {
        if !seen.insert(chapter.id.as_str()) {
            return Some(chapter.id.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::catalog::DEFAULT_BOOK_TITLE;
    use crate::source::tests::sample_epub;

    const ALICE: &str = "https://www.gutenberg.org/ebooks/11.kindle.images/epub/11.epub";

    struct FixedSource(Resolution);

    #[async_trait]
    impl BookSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn resolve(&self, _reference: &BookReference) -> Resolution {
            self.0.clone()
        }
    }

    fn three_chapter_book() -> ResolvedBook {
        ResolvedBook {
            metadata: BookMetadata::new("Three Men in a Boat", "Jerome K. Jerome", "en", "test"),
            chapters: vec![
                Chapter::new("one", "Three Invalids", "<p>There were four of us.</p>"),
                Chapter::new("two", "Plans Discussed", "<p>Harris said.</p>"),
                Chapter::new("three", "Arrangements Settled", "<p>So, on the following evening.</p>"),
            ],
            origin: LoadOrigin::Container,
        }
    }

    fn fixed(book: ResolvedBook) -> ChapterNavigator {
        ChapterNavigator::builder("memory://three-men")
            .with_source(FixedSource(Resolution::Recognized(book)))
            .build()
    }

    fn record(nav: &ChapterNavigator, kind: EventKind) -> Arc<Mutex<Vec<NavigatorEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _ = nav.subscribe(kind, move |event| sink.lock().push(event.clone()));
        seen
    }

    #[tokio::test]
    async fn test_methods_before_init_fail() {
        let mut nav = ChapterNavigator::new(ALICE);
        assert!(!nav.is_initialized());
        assert_eq!(nav.chapters().unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.chapter_content(0).unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.next().await.unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.previous().await.unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.go_to_chapter(0).await.unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.metadata().unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.progress().unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.progress_percent().unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.total_chapters().unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.is_online_book().unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.origin().unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.current_chapter_index().unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(nav.current_chapter().unwrap_err(), NavigatorError::Uninitialized);
        assert_eq!(
            nav.go_to_chapter_id("chapter-1").await.unwrap_err(),
            NavigatorError::Uninitialized
        );
    }

    #[tokio::test]
    async fn test_alice_loads_from_catalog() {
        let mut nav = ChapterNavigator::new(ALICE);
        let loaded = record(&nav, EventKind::Loaded);
        assert_eq!(nav.init().await, LoadOrigin::Catalog);
        assert_eq!(nav.metadata().unwrap().title, "Alice's Adventures in Wonderland");
        assert_eq!(nav.total_chapters().unwrap(), 3);
        assert!(nav.is_online_book().unwrap());
        assert_eq!(nav.current_chapter_index().unwrap(), 0);

        let events = loaded.lock();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            NavigatorEvent::Loaded { chapter_count: 3, is_online: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_bad_reference_falls_back_to_default() {
        let mut nav = ChapterNavigator::new("not-a-real-url");
        let errors = record(&nav, EventKind::Error);
        assert_eq!(nav.init().await, LoadOrigin::BuiltIn);
        assert_eq!(nav.metadata().unwrap().title, DEFAULT_BOOK_TITLE);
        assert!(!nav.is_online_book().unwrap());
        assert!(nav.total_chapters().unwrap() > 0);

        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            NavigatorEvent::Error(ResolveFailure::ParseFailed { source_name: "container", .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_remote_url_reports_unrecognized() {
        let mut nav = ChapterNavigator::new("https://example.com/books/great-gatsby.epub");
        let errors = record(&nav, EventKind::Error);
        assert_eq!(nav.init().await, LoadOrigin::BuiltIn);
        let errors = errors.lock();
        assert_eq!(
            *errors,
            vec![NavigatorEvent::Error(ResolveFailure::Unrecognized {
                reference: "https://example.com/books/great-gatsby.epub".into()
            })]
        );
    }

    #[tokio::test]
    async fn test_no_reference_loads_default_quietly() {
        let mut nav = ChapterNavigator::new(BookReference::None);
        let errors = record(&nav, EventKind::Error);
        assert_eq!(nav.init().await, LoadOrigin::BuiltIn);
        assert!(errors.lock().is_empty());
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let mut nav = ChapterNavigator::new(ALICE);
        let loaded = record(&nav, EventKind::Loaded);
        let first = nav.init().await;
        let chapters = nav.chapters().unwrap();
        let _ = nav.go_to_chapter(2).await.unwrap();

        assert_eq!(nav.init().await, first);
        assert_eq!(nav.chapters().unwrap(), chapters);
        assert_eq!(nav.current_chapter_index().unwrap(), 2);
        assert_eq!(loaded.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_next_next_previous() {
        let mut nav = fixed(three_chapter_book());
        let changes = record(&nav, EventKind::ChapterChanged);
        nav.init().await;

        assert!(nav.next().await.unwrap().is_some());
        assert!(nav.next().await.unwrap().is_some());
        assert!(nav.previous().await.unwrap().is_some());
        assert_eq!(nav.current_chapter_index().unwrap(), 1);

        let indexes: Vec<_> = changes
            .lock()
            .iter()
            .map(|event| match event {
                NavigatorEvent::ChapterChanged { index, .. } => *index,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(indexes, vec![1, 2, 1]);
    }

    #[tokio::test]
    async fn test_boundaries_return_none_without_events() {
        let mut nav = fixed(three_chapter_book());
        let changes = record(&nav, EventKind::ChapterChanged);
        nav.init().await;

        assert_eq!(nav.previous().await.unwrap(), None);
        assert_eq!(nav.current_chapter_index().unwrap(), 0);
        assert!(changes.lock().is_empty());

        let _ = nav.go_to_chapter(2).await.unwrap();
        changes.lock().clear();
        assert_eq!(nav.next().await.unwrap(), None);
        assert_eq!(nav.current_chapter_index().unwrap(), 2);
        assert!(changes.lock().is_empty());
    }

    #[tokio::test]
    async fn test_walk_visits_every_chapter() {
        let mut nav = ChapterNavigator::new(ALICE);
        nav.init().await;
        let total = nav.total_chapters().unwrap();
        let mut visited = vec![nav.current_chapter().unwrap().id.clone()];
        while nav.next().await.unwrap().is_some() {
            visited.push(nav.current_chapter().unwrap().id.clone());
        }
        assert_eq!(visited.len(), total);
        assert_eq!(nav.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_go_to_chapter_out_of_range() {
        for count in 1..=4 {
            let mut book = three_chapter_book();
            book.chapters.truncate(count.min(3));
            if count == 4 {
                book.chapters.push(Chapter::new("four", "Extra", ""));
            }
            let total = book.chapters.len();
            let mut nav = fixed(book);
            nav.init().await;
            assert_eq!(
                nav.go_to_chapter(total).await.unwrap_err(),
                NavigatorError::InvalidIndex {
                    index: total,
                    chapter_count: total
                }
            );
            assert_eq!(nav.current_chapter_index().unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn test_go_to_chapter_id() {
        let mut nav = fixed(three_chapter_book());
        let changes = record(&nav, EventKind::ChapterChanged);
        nav.init().await;

        let doc = nav.go_to_chapter_id("three").await.unwrap();
        assert!(doc.contains("Arrangements Settled"));
        assert_eq!(nav.current_chapter_index().unwrap(), 2);
        assert_eq!(changes.lock().len(), 1);

        assert_eq!(
            nav.go_to_chapter_id("nine").await.unwrap_err(),
            NavigatorError::UnknownChapter { id: "nine".into() }
        );
    }

    #[tokio::test]
    async fn test_chapter_content_contains_title_and_ordinal_once() {
        let mut nav = fixed(three_chapter_book());
        nav.init().await;
        for (index, chapter) in nav.chapters().unwrap().iter().enumerate() {
            let doc = nav.chapter_content(index).unwrap();
            assert_eq!(doc.matches(chapter.title.as_str()).count(), 1);
            assert_eq!(doc.matches(&format!("Chapter {}", index + 1)).count(), 1);
        }
        assert_eq!(
            nav.chapter_content(3).unwrap_err(),
            NavigatorError::ChapterOutOfRange {
                index: 3,
                chapter_count: 3
            }
        );
        assert_eq!(nav.current_chapter_index().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_book_falls_back() {
        let mut book = three_chapter_book();
        book.chapters.clear();
        let mut nav = fixed(book);
        let errors = record(&nav, EventKind::Error);
        assert_eq!(nav.init().await, LoadOrigin::BuiltIn);
        assert!(matches!(
            &errors.lock()[0],
            NavigatorEvent::Error(ResolveFailure::ParseFailed {
                error: EpubError::EmptySpine,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_chapter_ids_fall_back() {
        let mut book = three_chapter_book();
        book.chapters[2].id = "one".into();
        let mut nav = fixed(book);
        let errors = record(&nav, EventKind::Error);
        assert_eq!(nav.init().await, LoadOrigin::BuiltIn);
        assert_eq!(
            *errors.lock(),
            vec![NavigatorEvent::Error(ResolveFailure::ParseFailed {
                source_name: "fixed",
                error: EpubError::DuplicateChapterId { id: "one".into() },
            })]
        );
    }

    #[tokio::test]
    async fn test_error_fires_before_loaded() {
        let mut nav = ChapterNavigator::new("not-a-real-url");
        let order = Arc::new(Mutex::new(Vec::new()));
        for kind in [EventKind::Loaded, EventKind::Error] {
            let sink = Arc::clone(&order);
            let _ = nav.subscribe(kind, move |event| sink.lock().push(event.kind()));
        }
        nav.init().await;
        assert_eq!(*order.lock(), vec![EventKind::Error, EventKind::Loaded]);
    }

    #[tokio::test]
    async fn test_failed_source_then_next_source() {
        let mut nav = ChapterNavigator::builder("memory://three-men")
            .with_source(FixedSource(Resolution::ParseFailed(EpubError::Parse("bad".into()))))
            .with_source(FixedSource(Resolution::Unrecognized))
            .with_source(FixedSource(Resolution::Recognized(three_chapter_book())))
            .build();
        let errors = record(&nav, EventKind::Error);
        assert_eq!(nav.init().await, LoadOrigin::Container);
        assert_eq!(errors.lock().len(), 1);
        assert_eq!(nav.metadata().unwrap().title, "Three Men in a Boat");
    }

    #[tokio::test]
    async fn test_empty_source_list_uses_default() {
        let mut nav = ChapterNavigator::builder(ALICE).with_sources(Vec::new()).build();
        assert_eq!(nav.init().await, LoadOrigin::BuiltIn);
    }

    #[tokio::test]
    async fn test_render_options_reach_documents() {
        let mut nav = ChapterNavigator::builder(ALICE)
            .with_render_options(RenderOptions::default().with_font_size(22))
            .build();
        nav.init().await;
        assert!(nav.chapter_content(0).unwrap().contains("font-size: 22px"));
    }

    #[tokio::test]
    async fn test_progress() {
        let mut nav = fixed(three_chapter_book());
        nav.init().await;
        assert_eq!(nav.progress().unwrap(), (0, 3));
        assert_eq!(nav.progress_percent().unwrap(), 33);
        let _ = nav.go_to_chapter(2).await.unwrap();
        assert_eq!(nav.progress().unwrap(), (2, 3));
        assert_eq!(nav.progress_percent().unwrap(), 100);
    }

    #[tokio::test]
    async fn test_local_epub_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("time-machine.epub");
        std::fs::write(&path, sample_epub()).unwrap();

        let mut nav = ChapterNavigator::new(path.to_str().unwrap());
        assert_eq!(nav.init().await, LoadOrigin::Container);
        assert_eq!(nav.metadata().unwrap().title, "The Time Machine");
        assert!(!nav.is_online_book().unwrap());
        assert_eq!(nav.current_chapter().unwrap().title, "The Inventor");
    }

    #[test]
    fn test_navigator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChapterNavigator>();
    }
}
