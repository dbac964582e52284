//! The Publisher/Book walkthrough, step by step

use chrono::{TimeZone, Utc};
use tracing::info;
use typed_surreal::{Edge, Result};

use crate::library::Library;
use crate::model::{Book, Publisher};

pub const PUBLISHER_NAME: &str = "SurrealDB";
pub const FEATURED_AUTHOR: &str = "Dave MacLeod";

/// Everything the walkthrough observed, in order
#[derive(Debug, Clone)]
pub struct Report {
    pub publisher: Publisher,
    pub first_book: Book,
    pub edge: Edge,
    pub after_content_update: Book,
    pub second_book: Book,
    pub second_edge: Edge,
    pub listed: Vec<Book>,
    pub after_merge_update: Vec<Book>,
    pub by_author: Vec<Book>,
    pub publishers_of_first: Vec<Publisher>,
    pub publishers_of_second: Vec<Publisher>,
}

/// Run every step against `library`, then remove what it created.
pub async fn run(library: &Library) -> Result<Report> {
    let publisher = library.add_publisher(PUBLISHER_NAME).await?;

    let released = Utc
        .with_ymd_and_hms(2024, 10, 15, 0, 0, 0)
        .single()
        .unwrap_or_default();
    let (first_book, edge) = library
        .publish(
            &Book::new("Aeon's Surreal Renaissance", FEATURED_AUTHOR, released),
            &publisher,
        )
        .await?;
    info!(book = %edge.from, publisher = %edge.to, "Book related to publisher");

    let mut unavailable = first_book.clone();
    unavailable.available = false;
    let after_content_update = library.replace(&unavailable).await?;

    let (second_book, second_edge) = library
        .publish(
            &Book::new("Surrealist for dummies", "Julian Mills", Utc::now()),
            &publisher,
        )
        .await?;

    let listed = library.books().await?;
    let after_merge_update = library.set_all_available(true).await?;
    let by_author = library.books_by(FEATURED_AUTHOR).await?;
    let publishers_of_first = library.publishers_of(&first_book).await?;
    let publishers_of_second = library.publishers_of(&second_book).await?;

    library.clear(&publisher).await?;
    info!("Walkthrough finished");

    Ok(Report {
        publisher,
        first_book,
        edge,
        after_content_update,
        second_book,
        second_edge,
        listed,
        after_merge_update,
        by_author,
        publishers_of_first,
        publishers_of_second,
    })
}
