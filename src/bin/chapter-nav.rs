use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use chapter_nav::{ChapterNavigator, EventKind, NavigatorEvent, RenderOptions};

/// Inspect how a book reference resolves and renders.
#[derive(Parser, Debug)]
#[command(name = "chapter-nav", version, about)]
struct Cli {
    /// Log resolution steps (info level, overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print book metadata and where it was loaded from
    Metadata {
        /// Catalog URL or EPUB path
        reference: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List chapters in reading order
    Chapters {
        /// Catalog URL or EPUB path
        reference: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the rendered document for one chapter
    Show {
        /// Catalog URL or EPUB path
        reference: String,
        /// Chapter index (0-based)
        #[arg(short, long, default_value_t = 0)]
        chapter: usize,
        /// Body font size in CSS pixels
        #[arg(long, default_value_t = 16)]
        font_size: u32,
    },
    /// Step through every chapter with `next`, printing each change
    Walk {
        /// Catalog URL or EPUB path
        reference: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Metadata { reference, json } => {
            let nav = load(&reference, RenderOptions::default()).await;
            let metadata = nav.metadata().map_err(display_err)?;
            let origin = nav.origin().map_err(display_err)?;
            if json {
                let output = json!({
                    "reference": reference,
                    "origin": origin,
                    "online": origin.is_online(),
                    "metadata": metadata,
                });
                println!("{}", to_json(&output)?);
            } else {
                println!("title:    {}", metadata.title);
                println!("author:   {}", metadata.author);
                println!("language: {}", metadata.language);
                println!("source:   {}", metadata.source);
                println!("origin:   {}", origin);
                println!("online:   {}", origin.is_online());
            }
        }
        Command::Chapters { reference, json } => {
            let nav = load(&reference, RenderOptions::default()).await;
            let chapters = nav.chapters().map_err(display_err)?;
            if json {
                let items: Vec<_> = chapters
                    .iter()
                    .enumerate()
                    .map(|(index, chapter)| {
                        json!({ "index": index, "id": chapter.id, "title": chapter.title })
                    })
                    .collect();
                println!("{}", to_json(&items)?);
            } else {
                for (index, chapter) in chapters.iter().enumerate() {
                    println!("{:>3}  {:<24} {}", index, chapter.id, chapter.title);
                }
            }
        }
        Command::Show {
            reference,
            chapter,
            font_size,
        } => {
            let options = RenderOptions::default().with_font_size(font_size);
            let nav = load(&reference, options).await;
            let document = nav.chapter_content(chapter).map_err(display_err)?;
            print!("{}", document);
        }
        Command::Walk { reference } => {
            let mut nav = load(&reference, RenderOptions::default()).await;
            let _ = nav.subscribe(EventKind::ChapterChanged, |event| {
                if let NavigatorEvent::ChapterChanged { index, chapter } = event {
                    println!("-> {:>3}  {}", index, chapter.title);
                }
            });
            let first = nav.current_chapter().map_err(display_err)?;
            println!("   {:>3}  {}", 0, first.title);
            while nav.next().await.map_err(display_err)?.is_some() {}
            let (current, total) = nav.progress().map_err(display_err)?;
            println!("end of book at chapter {} of {}", current + 1, total);
        }
    }
    Ok(())
}

async fn load(reference: &str, render: RenderOptions) -> ChapterNavigator {
    let mut nav = ChapterNavigator::builder(reference)
        .with_render_options(render)
        .build();
    let _ = nav.subscribe(EventKind::Error, |event| {
        if let NavigatorEvent::Error(failure) = event {
            eprintln!("warning: {}", failure);
        }
    });
    nav.init().await;
    nav
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(display_err)
}

fn display_err<E: std::fmt::Display>(err: E) -> String {
    err.to_string()
}
