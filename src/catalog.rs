//! Built-in book content.
//!
//! Known online books are matched by exact URL. Their text is a short
//! hand-picked excerpt of the public-domain originals rather than the full
//! EPUB. `default_book` is what every failed resolution falls back to.

use crate::book::{BookMetadata, Chapter, LoadOrigin, ResolvedBook};

/// Title of the built-in fallback book.
pub const DEFAULT_BOOK_TITLE: &str = "Welcome to Your Library";

const GUTENBERG_SOURCE: &str = "Project Gutenberg";

struct ChapterEntry {
    id: &'static str,
    title: &'static str,
    paragraphs: &'static [&'static str],
}

struct CatalogEntry {
    url: &'static str,
    title: &'static str,
    author: &'static str,
    language: &'static str,
    chapters: &'static [ChapterEntry],
}

const KNOWN_BOOKS: &[CatalogEntry] = &[
    CatalogEntry {
        url: "https://www.gutenberg.org/ebooks/1342.kindle.images/epub/1342.epub",
        title: "Pride and Prejudice",
        author: "Jane Austen",
        language: "en",
        chapters: &[
            ChapterEntry {
                id: "pride-chapter-1",
                title: "Chapter I",
                paragraphs: &[
                    "It is a truth universally acknowledged, that a single man in possession of a good fortune, must be in want of a wife.",
                    "However little known the feelings or views of such a man may be on his first entering a neighbourhood, this truth is so well fixed in the minds of the surrounding families, that he is considered the rightful property of some one or other of their daughters.",
                    "\"My dear Mr. Bennet,\" said his lady to him one day, \"have you heard that Netherfield Park is let at last?\"",
                ],
            },
            ChapterEntry {
                id: "pride-chapter-2",
                title: "Chapter II",
                paragraphs: &[
                    "Mr. Bennet was among the earliest of those who waited on Mr. Bingley. He had always intended to visit him, though to the last always assuring his wife that he should not go.",
                    "Till the evening after the visit was paid she had no knowledge of it. It was then disclosed in the following manner.",
                ],
            },
            ChapterEntry {
                id: "pride-chapter-3",
                title: "Chapter III",
                paragraphs: &[
                    "Not all that Mrs. Bennet, however, with the assistance of her five daughters, could ask on the subject, was sufficient to draw from her husband any satisfactory description of Mr. Bingley.",
                    "Mr. Bingley was good-looking and gentlemanlike; he had a pleasant countenance, and easy, unaffected manners.",
                ],
            },
        ],
    },
    CatalogEntry {
        url: "https://www.gutenberg.org/ebooks/2701.kindle.images/epub/2701.epub",
        title: "Moby Dick",
        author: "Herman Melville",
        language: "en",
        chapters: &[
            ChapterEntry {
                id: "moby-loomings",
                title: "Loomings",
                paragraphs: &[
                    "Call me Ishmael. Some years ago, never mind how long precisely, having little or no money in my purse, and nothing particular to interest me on shore, I thought I would sail about a little and see the watery part of the world.",
                    "It is a way I have of driving off the spleen and regulating the circulation.",
                ],
            },
            ChapterEntry {
                id: "moby-carpet-bag",
                title: "The Carpet-Bag",
                paragraphs: &[
                    "I stuffed a shirt or two into my old carpet-bag, tucked it under my arm, and started for Cape Horn and the Pacific.",
                    "Quitting the good city of old Manhatto, I duly arrived in New Bedford. It was a Saturday night in December.",
                ],
            },
        ],
    },
    CatalogEntry {
        url: "https://www.gutenberg.org/ebooks/1661.kindle.images/epub/1661.epub",
        title: "The Adventures of Sherlock Holmes",
        author: "Arthur Conan Doyle",
        language: "en",
        chapters: &[
            ChapterEntry {
                id: "holmes-scandal-in-bohemia",
                title: "A Scandal in Bohemia",
                paragraphs: &[
                    "To Sherlock Holmes she is always the woman. I have seldom heard him mention her under any other name.",
                    "In his eyes she eclipses and predominates the whole of her sex. It was not that he felt any emotion akin to love for Irene Adler.",
                ],
            },
            ChapterEntry {
                id: "holmes-red-headed-league",
                title: "The Red-Headed League",
                paragraphs: &[
                    "I had called upon my friend, Mr. Sherlock Holmes, one day in the autumn of last year and found him in deep conversation with a very stout, florid-faced, elderly gentleman with fiery red hair.",
                ],
            },
        ],
    },
    CatalogEntry {
        url: "https://www.gutenberg.org/ebooks/11.kindle.images/epub/11.epub",
        title: "Alice's Adventures in Wonderland",
        author: "Lewis Carroll",
        language: "en",
        chapters: &[
            ChapterEntry {
                id: "alice-rabbit-hole",
                title: "Down the Rabbit-Hole",
                paragraphs: &[
                    "Alice was beginning to get very tired of sitting by her sister on the bank, and of having nothing to do: once or twice she had peeped into the book her sister was reading, but it had no pictures or conversations in it, \"and what is the use of a book,\" thought Alice, \"without pictures or conversations?\"",
                    "So she was considering in her own mind, as well as she could, for the hot day made her feel very sleepy and stupid, whether the pleasure of making a daisy-chain would be worth the trouble of getting up and picking the daisies, when suddenly a White Rabbit with pink eyes ran close by her.",
                ],
            },
            ChapterEntry {
                id: "alice-pool-of-tears",
                title: "The Pool of Tears",
                paragraphs: &[
                    "\"Curiouser and curiouser!\" cried Alice (she was so much surprised, that for the moment she quite forgot how to speak good English).",
                    "\"Now I'm opening out like the largest telescope that ever was! Good-bye, feet!\"",
                ],
            },
            ChapterEntry {
                id: "alice-caucus-race",
                title: "A Caucus-Race and a Long Tale",
                paragraphs: &[
                    "They were indeed a queer-looking party that assembled on the bank: the birds with draggled feathers, the animals with their fur clinging close to them, and all dripping wet, cross, and uncomfortable.",
                    "The first question of course was, how to get dry again.",
                ],
            },
        ],
    },
];

const DEFAULT_CHAPTERS: &[ChapterEntry] = &[
    ChapterEntry {
        id: "welcome",
        title: "Getting Started",
        paragraphs: &[
            "This book opens whenever the requested title could not be loaded.",
            "Use the next and previous controls to move between chapters, or pick a chapter from the contents list.",
        ],
    },
    ChapterEntry {
        id: "reading-tips",
        title: "Reading Comfortably",
        paragraphs: &[
            "Text size can be adjusted from the reader controls. The page follows the light or dark appearance of your device.",
        ],
    },
    ChapterEntry {
        id: "your-library",
        title: "Building Your Library",
        paragraphs: &[
            "Books you download appear in your library and open at the chapter where you left off.",
        ],
    },
];

/// Look up a known online book by exact URL.
pub fn lookup(url: &str) -> Option<ResolvedBook> {
    KNOWN_BOOKS.iter().find(|entry| entry.url == url).map(|entry| {
        build(
            BookMetadata::new(entry.title, entry.author, entry.language, GUTENBERG_SOURCE),
            entry.chapters,
            LoadOrigin::Catalog,
        )
    })
}

/// URLs of every known online book.
pub fn known_urls() -> impl Iterator<Item = &'static str> {
    KNOWN_BOOKS.iter().map(|entry| entry.url)
}

/// The built-in fallback book.
pub fn default_book() -> ResolvedBook {
    build(
        BookMetadata::new(DEFAULT_BOOK_TITLE, "Library Team", "en", "Built-in sample content"),
        DEFAULT_CHAPTERS,
        LoadOrigin::BuiltIn,
    )
}

fn build(metadata: BookMetadata, chapters: &[ChapterEntry], origin: LoadOrigin) -> ResolvedBook {
    let chapters = chapters
        .iter()
        .map(|entry| Chapter::new(entry.id, entry.title, paragraphs_to_html(entry.paragraphs)))
        .collect();
    ResolvedBook {
        metadata,
        chapters,
        origin,
    }
}

fn paragraphs_to_html(paragraphs: &[&str]) -> String {
    paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", quick_xml::escape::partial_escape(*p)))
        .collect::<Vec<_>>()
        .join("\n")
}
